//! An append-only, eventually-consistent log built on a grow-only set of
//! entries forming a causal DAG, with a Lamport clock tie-break over
//! anything concurrent (§3 "Log", §4.3-§4.6).

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};

use crate::entry::{find_children, Entry, EntryOrHash};
use crate::error::LogError;
use crate::gset::GSet;
use crate::keystore::Keypair;
use crate::lamport_clock::LamportClock;
use crate::log_options::{LogOptions, ANY_KEY};
use crate::store::EntryStore;
use crate::util::{find_heads, find_tail_hashes, find_tails};

/// A grow-only set of entries, augmented with a causal DAG and a Lamport
/// clock (§3 "Log").
#[derive(Debug)]
pub struct Log {
	id: String,
	entries: HashMap<String, Entry>,
	heads: HashMap<String, Entry>,
	clock: LamportClock,
	own_key: Option<Keypair>,
	allowed_keys: GSet<String>,
}

fn generate_log_id () -> String {
	let millis = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_millis())
		.unwrap_or(0);
	format!("{}-{:x}", millis, rand::random::<u32>())
}

impl Log {
	/// Constructs a log from `options` (§4.3). Entries and heads seeded via
	/// `options` are trusted to already be internally consistent (as they
	/// would be after a [`crate::log_io::LogIO`] fetch); this still validates
	/// that declared heads are present and that internal `next` edges point
	/// strictly backwards in time.
	pub fn new (options: LogOptions) -> Result<Log, LogError> {
		let parts = options.into_parts();

		let id = parts.id.unwrap_or_else(generate_log_id);

		let entries: HashMap<String, Entry> = parts.entries.into_iter()
			.map(|e| (e.hash.clone(), e))
			.collect();

		for entry in entries.values() {
			for next_hash in &entry.next {
				if let Some(predecessor) = entries.get(next_hash) {
					if predecessor.clock.time() >= entry.clock.time() {
						return Err(LogError::BadEntries(format!(
							"entry {} does not strictly follow predecessor {} in clock time",
							entry.hash, next_hash,
						)));
					}
				}
			}
		}

		let heads: HashMap<String, Entry> = if parts.heads.is_empty() {
			find_heads(&entries.values().cloned().collect::<Vec<_>>())
				.into_iter()
				.map(|e| (e.hash.clone(), e))
				.collect()
		} else {
			let mut map = HashMap::with_capacity(parts.heads.len());
			for hash in parts.heads {
				let entry = entries.get(&hash).cloned()
					.ok_or_else(|| LogError::BadHeads(format!("head {} is not present in entries", hash)))?;
				map.insert(hash, entry);
			}
			map
		};

		let heads_time = heads.values().map(|e| e.clock.time()).max().unwrap_or(0);
		let clock_time = parts.clock.as_ref().map(|c| c.time()).unwrap_or(0).max(heads_time);
		let clock_id = parts.own_key.as_ref().map(|k| k.public_identity()).unwrap_or_else(|| id.clone());

		Ok(Log {
			id,
			entries,
			heads,
			clock: LamportClock::new(&clock_id).with_time(clock_time),
			own_key: parts.own_key,
			allowed_keys: parts.allowed_keys,
		})
	}

	pub fn id (&self) -> &str {
		&self.id
	}

	pub fn clock (&self) -> &LamportClock {
		&self.clock
	}

	pub fn len (&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty (&self) -> bool {
		self.entries.is_empty()
	}

	/// All entries, oldest first under `Entry::compare`.
	pub fn values (&self) -> Vec<&Entry> {
		let mut values: Vec<&Entry> = self.entries.values().collect();
		values.sort_by(|a, b| Entry::compare(a, b));
		values
	}

	/// The DAG's frontier, sorted by `clock.id` ascending (§4.6).
	pub fn heads (&self) -> Vec<&Entry> {
		let mut heads: Vec<&Entry> = self.heads.values().collect();
		heads.sort_by(|a, b| a.clock.id().cmp(b.clock.id()));
		heads
	}

	/// Entries that reference a predecessor outside the log, or none at all.
	pub fn tails (&self) -> Vec<Entry> {
		find_tails(&self.entries.values().cloned().collect::<Vec<_>>())
	}

	/// The hashes those external references point to.
	pub fn tail_hashes (&self) -> Vec<String> {
		find_tail_hashes(&self.entries.values().cloned().collect::<Vec<_>>())
	}

	/// Appends `payload` as a new entry following the current heads (§4.4).
	///
	/// Advances the clock strictly past every current head, replaces `heads`
	/// with the singleton new entry, and — when `own_key` is set — signs the
	/// entry after checking it against `allowedKeys`.
	pub fn append (&mut self, store: &mut dyn EntryStore, payload: &[u8]) -> Result<Entry, LogError> {
		if let Some(own_key) = &self.own_key {
			let identity = own_key.public_identity();
			if !(self.allowed_keys.contains(identity.as_str()) || self.allowed_keys.contains(ANY_KEY)) {
				return Err(LogError::NotAllowedToWrite(identity));
			}
		}

		let heads_time = self.heads.values().map(|e| e.clock.time()).max().unwrap_or(0);
		let new_time = self.clock.time().max(heads_time) + 1;
		self.clock = LamportClock::new(self.clock.id()).with_time(new_time);

		let predecessors: Vec<EntryOrHash> = self.heads.values().map(EntryOrHash::Entry).collect();
		let entry = Entry::create(store, &self.id, payload, &predecessors, self.clock.clone(), self.own_key.as_ref())?;

		self.entries.insert(entry.hash.clone(), entry.clone());
		self.heads.clear();
		self.heads.insert(entry.hash.clone(), entry.clone());

		debug!("log {}: appended entry {}", self.id, entry.hash);
		Ok(entry)
	}

	/// The set of entries reachable from `other`'s heads that are not
	/// already present locally (§4.5 step 2). Traversal is breadth-first and
	/// stops at any hash already known to `self`.
	pub fn diff (&self, other: &Log) -> HashMap<String, Entry> {
		let mut new_items: HashMap<String, Entry> = HashMap::new();
		let mut visited: HashSet<String> = HashSet::new();
		let mut frontier: VecDeque<String> = other.heads.keys().cloned().collect();

		while let Some(hash) = frontier.pop_front() {
			if self.entries.contains_key(&hash) || !visited.insert(hash.clone()) {
				continue;
			}
			if let Some(entry) = other.entries.get(&hash) {
				for next_hash in &entry.next {
					if !self.entries.contains_key(next_hash) {
						frontier.push_back(next_hash.clone());
					}
				}
				new_items.insert(hash, entry.clone());
			}
		}

		new_items
	}

	/// Merges `other` into `self` (§4.5). `other` is left untouched.
	///
	/// In signed mode, an incoming entry missing `key`/`sig` aborts the
	/// whole join with an error (no mutation); an entry signed by a
	/// disallowed key also aborts the join, but silently (`Ok(())`, just a
	/// warning logged); an entry that fails cryptographic verification, or
	/// whose `id` mismatches under solo-owner access, is dropped and the
	/// join proceeds with the remainder.
	pub fn join (
		&mut self,
		store: &dyn EntryStore,
		other: &Log,
		size_limit: Option<usize>,
		new_id: Option<&str>,
	) -> Result<(), LogError> {
		let mut new_items = self.diff(other);

		if let Some(own_key) = &self.own_key {
			let own_identity = own_key.public_identity();
			let allow_any = self.allowed_keys.contains(ANY_KEY);
			let solo_owner = self.allowed_keys.len() == 1 && self.allowed_keys.contains(&own_identity);

			let mut verified: HashMap<String, Entry> = HashMap::with_capacity(new_items.len());
			for (hash, entry) in new_items.drain() {
				let key = entry.key.clone().ok_or(LogError::EntryMissingKey)?;
				if entry.sig.is_none() {
					return Err(LogError::EntryMissingSig);
				}

				if !allow_any && !(self.allowed_keys.contains(&key) || key == own_identity) {
					warn!("log {}: join aborted, entry {} signed by disallowed key {}", self.id, hash, key);
					return Ok(());
				}

				match Entry::verify(&entry, store.keystore()) {
					Ok(true) => {}
					Ok(false) => {
						warn!("log {}: dropping entry {} with invalid signature", self.id, hash);
						continue;
					}
					Err(e) => return Err(e),
				}

				if solo_owner && entry.id != self.id {
					warn!("log {}: dropping entry {} from mismatched log id {}", self.id, hash, entry.id);
					continue;
				}

				verified.insert(hash, entry);
			}
			new_items = verified;
		}

		self.entries.extend(new_items);

		if let Some(limit) = size_limit {
			if self.entries.len() > limit {
				let mut all: Vec<Entry> = self.entries.values().cloned().collect();
				all.sort_by(Entry::compare);
				let kept: HashMap<String, Entry> = all.into_iter()
					.rev()
					.take(limit)
					.map(|e| (e.hash.clone(), e))
					.collect();
				debug!("log {}: trimmed to {} entries", self.id, kept.len());
				self.entries = kept;
			}
		}

		self.heads = find_heads(&self.entries.values().cloned().collect::<Vec<_>>())
			.into_iter()
			.map(|e| (e.hash.clone(), e))
			.collect();

		let heads_time = self.heads.values().map(|e| e.clock.time()).max().unwrap_or(0);
		self.clock = LamportClock::new(self.clock.id()).with_time(self.clock.time().max(heads_time));

		self.id = match new_id {
			Some(id) => id.to_owned(),
			None => if other.id > self.id { other.id.clone() } else { std::mem::take(&mut self.id) },
		};

		Ok(())
	}

	/// `{ id, heads: [hash] }` — the minimal root-pointer record (§6).
	pub fn to_json (&self) -> serde_json::Value {
		let mut heads: Vec<&Entry> = self.heads.values().collect();
		heads.sort_by(|a, b| a.clock.id().cmp(b.clock.id()));
		serde_json::json!({
			"id": self.id,
			"heads": heads.into_iter().map(|e| e.hash.clone()).collect::<Vec<_>>(),
		})
	}

	/// `{ id, heads: [Entry], values: [Entry] }` — the full materialization (§6).
	pub fn to_snapshot (&self) -> serde_json::Value {
		serde_json::json!({
			"id": self.id,
			"heads": self.heads(),
			"values": self.values(),
		})
	}

	/// UTF-8 bytes of `to_json()` (§6).
	pub fn to_buffer (&self) -> Vec<u8> {
		self.to_json().to_string().into_bytes()
	}

	/// Persists `to_buffer()` into `store` and returns its digest — the root
	/// hash a peer can hand to [`crate::log_io::LogIO::from_multihash`] to
	/// reconstruct this log (§4.7, §8 "round-trip").
	pub fn to_multihash (&self, store: &mut dyn EntryStore) -> Result<String, LogError> {
		store.put(&self.to_buffer())
	}

	/// A human-readable tree, newest entry first, indented by transitive
	/// child count. `payload_mapper` renders a payload as text; defaults to
	/// a lossy UTF-8 decode.
	pub fn render (&self, payload_mapper: Option<&dyn Fn(&[u8]) -> String>) -> String {
		let pool: Vec<Entry> = self.entries.values().cloned().collect();
		let mut values: Vec<Entry> = self.values().into_iter().cloned().collect();
		values.reverse();

		let mut out = String::new();
		for entry in &values {
			let depth = find_children(&pool, &entry.hash).len();
			if depth > 0 {
				out.push_str(&"  ".repeat(depth.saturating_sub(1)));
				out.push_str("└─");
			}
			match payload_mapper {
				Some(mapper) => out.push_str(&mapper(&entry.payload)),
				None => out.push_str(&String::from_utf8_lossy(&entry.payload)),
			}
			out.push('\n');
		}
		out
	}
}

impl std::fmt::Display for Log {
	fn fmt (&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.render(None))
	}
}
