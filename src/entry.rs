//! Immutable DAG nodes (§3 "Entry", §4.2).
//!
//! An `Entry` carries a payload, the hashes of the heads it was appended
//! after (`next`), the clock value it was stamped with, and — in signed
//! mode — the signer's public identity and a signature over everything but
//! the hash and signature themselves.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::LogError;
use crate::keystore::{Keypair, SignatureAdapter};
use crate::lamport_clock::LamportClock;
use crate::store::EntryStore;

/// The entry format version written into every record (§6, canonical key `v`).
pub const ENTRY_VERSION: u32 = 1;

/// A predecessor reference passed to [`Entry::create`]: either an
/// already-materialized entry (the common case, since `Log::append` always
/// has its current heads in hand) or a bare hash (for constructing entries
/// against predecessors that have not been fetched locally).
#[derive(Debug, Clone, Copy)]
pub enum EntryOrHash<'a> {
	Entry (&'a Entry),
	Hash (&'a str),
}

impl<'a> EntryOrHash<'a> {
	pub fn hash (&self) -> &str {
		match self {
			EntryOrHash::Entry(e) => &e.hash,
			EntryOrHash::Hash(h) => h,
		}
	}
}

/// An immutable log record. Field order mirrors the canonical serialization
/// of §6 (`hash, id, payload, next, v, clock, key, sig`) so that `serde_json`
/// emits byte-identical output across replicas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
	pub hash: String,
	pub id: String,
	pub payload: Vec<u8>,
	pub next: Vec<String>,
	pub v: u32,
	pub clock: LamportClock,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub key: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub sig: Option<String>,
}

/// The part of an entry that gets signed: everything except `hash`, `key`
/// and `sig` themselves (§4.2 step 2-3).
#[derive(Serialize)]
struct UnsignedBody<'a> {
	id: &'a str,
	payload: &'a [u8],
	next: &'a [String],
	v: u32,
	clock: &'a LamportClock,
}

/// The part of an entry that gets hashed: everything except `hash` (§3:
/// "derived from the serialized form that includes id, payload, next, clock,
/// key, sig").
#[derive(Serialize)]
struct HashableRecord<'a> {
	id: &'a str,
	payload: &'a [u8],
	next: &'a [String],
	v: u32,
	clock: &'a LamportClock,
	#[serde(skip_serializing_if = "Option::is_none")]
	key: &'a Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	sig: &'a Option<String>,
}

/// Mirrors [`HashableRecord`], but owned and deserializable: the shape
/// actually persisted by [`crate::store::EntryStore::put`] (no `hash` field —
/// the store assigns that), used by [`crate::log_io::LogIO`] to rebuild an
/// `Entry` from fetched bytes plus the hash the store indexed it under.
#[derive(Deserialize)]
struct StoredRecord {
	id: String,
	payload: Vec<u8>,
	next: Vec<String>,
	v: u32,
	clock: LamportClock,
	#[serde(default)]
	key: Option<String>,
	#[serde(default)]
	sig: Option<String>,
}

impl Entry {
	/// Reconstructs an `Entry` from bytes fetched out of the store under
	/// `hash` (§4.7). The stored bytes never carry `hash` itself, so the
	/// caller-supplied store key becomes the entry's `hash`.
	pub fn from_stored_bytes (hash: &str, bytes: &[u8]) -> Result<Entry, LogError> {
		let record: StoredRecord = serde_json::from_slice(bytes)?;
		Ok(Entry {
			hash: hash.to_owned(),
			id: record.id,
			payload: record.payload,
			next: record.next,
			v: record.v,
			clock: record.clock,
			key: record.key,
			sig: record.sig,
		})
	}

	/// Builds, optionally signs, and persists a new entry, adopting the
	/// store's returned digest as `hash` (§4.2).
	///
	/// `predecessors` becomes `next` after being sorted and deduplicated by
	/// hash, guaranteeing two replicas that observe the same heads construct
	/// byte-identical entries.
	pub fn create (
		store: &mut dyn EntryStore,
		log_id: &str,
		payload: &[u8],
		predecessors: &[EntryOrHash<'_>],
		clock: LamportClock,
		signer: Option<&Keypair>,
	) -> Result<Entry, LogError> {
		let mut next: Vec<String> = predecessors.iter().map(|p| p.hash().to_owned()).collect();
		next.sort();
		next.dedup();

		let (key, sig) = match signer {
			Some(signer) => {
				let body = UnsignedBody { id: log_id, payload, next: &next, v: ENTRY_VERSION, clock: &clock };
				let body_bytes = serde_json::to_vec(&body)?;
				(Some(signer.public_identity()), Some(signer.sign(&body_bytes)?))
			}
			None => (None, None),
		};

		let hashable = HashableRecord {
			id: log_id,
			payload,
			next: &next,
			v: ENTRY_VERSION,
			clock: &clock,
			key: &key,
			sig: &sig,
		};
		let bytes = serde_json::to_vec(&hashable)?;
		let hash = store.put(&bytes)?;

		Ok(Entry {
			hash,
			id: log_id.to_owned(),
			payload: payload.to_owned(),
			next,
			v: ENTRY_VERSION,
			clock,
			key,
			sig,
		})
	}

	/// Verifies a signed entry against `keystore`. Fails when `key` or `sig`
	/// is missing; otherwise defers to the keystore's own true/false verdict.
	pub fn verify (entry: &Entry, keystore: &dyn SignatureAdapter) -> Result<bool, LogError> {
		let key = entry.key.as_ref().ok_or(LogError::EntryMissingKey)?;
		let sig = entry.sig.as_ref().ok_or(LogError::EntryMissingSig)?;
		let body = UnsignedBody {
			id: &entry.id,
			payload: &entry.payload,
			next: &entry.next,
			v: entry.v,
			clock: &entry.clock,
		};
		let bytes = serde_json::to_vec(&body)?;
		keystore.verify(key, sig, &bytes)
	}

	/// Total order used everywhere entries must be sorted: `(clock.time,
	/// clock.id, hash)` (§4.2).
	pub fn compare (a: &Entry, b: &Entry) -> Ordering {
		a.clock.time().cmp(&b.clock.time())
			.then_with(|| a.clock.id().cmp(b.clock.id()))
			.then_with(|| a.hash.cmp(&b.hash))
	}
}

impl PartialEq for Entry {
	fn eq (&self, other: &Self) -> bool {
		self.hash == other.hash
	}
}

impl Eq for Entry {}

impl Ord for Entry {
	fn cmp (&self, other: &Self) -> Ordering {
		Entry::compare(self, other)
	}
}

impl PartialOrd for Entry {
	fn partial_cmp (&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Entries in `pool` whose `next` transitively reaches `target` (§4.2
/// `findChildren`); used only to compute indentation depth when rendering a
/// log, never on the append/join hot path.
pub fn find_children (pool: &[Entry], target: &str) -> Vec<Entry> {
	let mut stack = vec![target.to_owned()];
	let mut visited: HashSet<String> = HashSet::new();
	let mut children = Vec::new();

	while let Some(hash) = stack.pop() {
		for entry in pool {
			if entry.next.iter().any(|n| n == &hash) && visited.insert(entry.hash.clone()) {
				children.push(entry.clone());
				stack.push(entry.hash.clone());
			}
		}
	}

	children
}
