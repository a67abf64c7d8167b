//! Reconstructs a [`Log`] from a root hash, a single entry, or an existing
//! log that needs deepening, by transitively fetching `next` edges out of
//! the store up to a depth/length bound (§4.7).

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Deserialize;

use crate::entry::Entry;
use crate::error::LogError;
use crate::lamport_clock::LamportClock;
use crate::log::Log;
use crate::log_options::LogOptions;
use crate::store::EntryStore;
use crate::util::find_heads;

/// `{ id, heads: [hash] }` — the shape `Log::to_json`/`Log::to_multihash`
/// produce, and what `from_multihash`/`from_json` expect to parse (§6).
#[derive(Deserialize)]
struct RootPointer {
	id: String,
	heads: Vec<String>,
}

/// Invoked once per fetched entry as `(hash, entry, parent_hash, depth)`
/// (§4.7 step 4).
pub type ProgressCallback<'a> = dyn FnMut(&str, &Entry, Option<&str>, usize) + 'a;

/// A fully materialized reconstruction: everything [`Log::new`] needs via
/// [`Reconstruction::into_options`] (§4.7 "Return the materialized entry
/// set plus the recovered heads and maximal clock").
#[derive(Debug)]
pub struct Reconstruction {
	pub id: String,
	pub values: Vec<Entry>,
	pub heads: Vec<Entry>,
	pub clock: LamportClock,
}

impl Reconstruction {
	/// Converts the reconstruction into [`LogOptions`], ready for `Log::new`.
	pub fn into_options (self) -> LogOptions {
		let heads: Vec<String> = self.heads.into_iter().map(|e| e.hash).collect();
		LogOptions::new()
			.id(&self.id)
			.entries(self.values)
			.heads(heads)
			.clock(self.clock)
	}
}

/// Namespace for the reconstruction variants of §4.7. None of these hold
/// state; each is a pure function of `store` plus its starting shape.
pub struct LogIO;

impl LogIO {
	/// Reconstructs from a root hash produced by `Log::to_multihash`: fetches
	/// the root pointer, then traverses from its heads (§4.7 steps 1-5).
	pub fn from_multihash (
		store: &dyn EntryStore,
		root_hash: &str,
		length: Option<usize>,
		exclude: &HashSet<String>,
		on_progress: Option<&mut ProgressCallback<'_>>,
	) -> Result<Reconstruction, LogError> {
		let root_bytes = store.get(root_hash)?;
		let root: RootPointer = serde_json::from_slice(&root_bytes)?;
		Self::traverse(store, root.id, HashMap::new(), &root.heads, length, exclude, on_progress)
	}

	/// Reconstructs starting from a single entry hash, treated as the sole
	/// head (§4.7 "fromEntryHash").
	pub fn from_entry_hash (
		store: &dyn EntryStore,
		id: &str,
		hash: &str,
		length: Option<usize>,
		exclude: &HashSet<String>,
		on_progress: Option<&mut ProgressCallback<'_>>,
	) -> Result<Reconstruction, LogError> {
		Self::traverse(store, id.to_owned(), HashMap::new(), &[hash.to_owned()], length, exclude, on_progress)
	}

	/// Reconstructs from a `Log::to_json` snapshot already in hand, without a
	/// further store fetch for the root pointer itself (§4.7 "fromJSON").
	pub fn from_json (
		store: &dyn EntryStore,
		json: &serde_json::Value,
		length: Option<usize>,
		exclude: &HashSet<String>,
		on_progress: Option<&mut ProgressCallback<'_>>,
	) -> Result<Reconstruction, LogError> {
		let root: RootPointer = serde_json::from_value(json.clone())?;
		Self::traverse(store, root.id, HashMap::new(), &root.heads, length, exclude, on_progress)
	}

	/// Reconstructs starting from an already-materialized entry, treated as
	/// the sole head (§4.7 "fromEntry").
	pub fn from_entry (
		store: &dyn EntryStore,
		id: &str,
		entry: &Entry,
		length: Option<usize>,
		exclude: &HashSet<String>,
		on_progress: Option<&mut ProgressCallback<'_>>,
	) -> Result<Reconstruction, LogError> {
		let mut seed = HashMap::new();
		seed.insert(entry.hash.clone(), entry.clone());
		Self::traverse(store, id.to_owned(), seed, &[entry.hash.clone()], length, exclude, on_progress)
	}

	/// Deepens an already-loaded log by `amount` more entries past its
	/// current tails (§4.7 "expand").
	pub fn expand (
		store: &dyn EntryStore,
		log: &Log,
		amount: usize,
		on_progress: Option<&mut ProgressCallback<'_>>,
	) -> Result<Reconstruction, LogError> {
		let tail_hashes = log.tail_hashes();
		let seed: HashMap<String, Entry> = log.values().into_iter().map(|e| (e.hash.clone(), e.clone())).collect();
		Self::traverse(store, log.id().to_owned(), seed, &tail_hashes, Some(amount), &HashSet::new(), on_progress)
	}

	/// Like `expand`, but starting from an explicit frontier of hashes
	/// rather than `log`'s own tails (§4.7 "expandFrom").
	pub fn expand_from (
		store: &dyn EntryStore,
		id: &str,
		from: &[String],
		amount: usize,
		exclude: &HashSet<String>,
		on_progress: Option<&mut ProgressCallback<'_>>,
	) -> Result<Reconstruction, LogError> {
		Self::traverse(store, id.to_owned(), HashMap::new(), from, Some(amount), exclude, on_progress)
	}

	/// Breadth-first fetch of `next` edges starting from `frontier`. Entries
	/// already present in `seed` are not re-fetched but still have their
	/// edges expanded. Halts once `length` entries have been collected or
	/// the frontier is exhausted (§4.7 steps 2-5, §9 "difference traversal").
	fn traverse (
		store: &dyn EntryStore,
		id: String,
		mut entries: HashMap<String, Entry>,
		frontier: &[String],
		length: Option<usize>,
		exclude: &HashSet<String>,
		mut on_progress: Option<&mut ProgressCallback<'_>>,
	) -> Result<Reconstruction, LogError> {
		let limit = length.unwrap_or(usize::MAX);
		let mut queued: HashSet<String> = HashSet::new();
		let mut queue: VecDeque<(String, Option<String>, usize)> = VecDeque::new();

		for hash in frontier {
			if queued.insert(hash.clone()) {
				queue.push_back((hash.clone(), None, 0));
			}
		}

		while let Some((hash, parent, depth)) = queue.pop_front() {
			if exclude.contains(&hash) {
				continue;
			}
			if entries.len() >= limit && !entries.contains_key(&hash) {
				continue;
			}

			let entry = match entries.get(&hash) {
				Some(e) => e.clone(),
				None => {
					let bytes = store.get(&hash)?;
					Entry::from_stored_bytes(&hash, &bytes)?
				}
			};

			if let Some(cb) = &mut on_progress {
				cb(&hash, &entry, parent.as_deref(), depth);
			}

			entries.insert(hash.clone(), entry.clone());

			if entries.len() < limit {
				for next_hash in &entry.next {
					if !exclude.contains(next_hash) && queued.insert(next_hash.clone()) {
						queue.push_back((next_hash.clone(), Some(hash.clone()), depth + 1));
					}
				}
			}
		}

		let pool: Vec<Entry> = entries.into_values().collect();
		let heads = find_heads(&pool);
		let mut values = pool;
		values.sort_by(Entry::compare);

		let clock = heads.iter()
			.max_by_key(|e| e.clock.time())
			.map(|e| e.clock.clone())
			.unwrap_or_else(|| LamportClock::new(&id));

		Ok(Reconstruction { id, values, heads, clock })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::entry::EntryOrHash;
	use crate::log_options::LogOptions;
	use crate::store::MemoryStore;

	fn clock (id: &str, time: u64) -> LamportClock {
		LamportClock::new(id).with_time(time)
	}

	#[test]
	fn from_multihash_round_trips_an_appended_log () {
		let mut store = MemoryStore::new();
		let mut log = Log::new(LogOptions::new().id("A")).unwrap();
		for i in 0..5u32 {
			log.append(&mut store, i.to_string().as_bytes()).unwrap();
		}
		let root_hash = log.to_multihash(&mut store).unwrap();

		let reconstructed = LogIO::from_multihash(&store, &root_hash, None, &HashSet::new(), None).unwrap();
		assert_eq!(reconstructed.id, log.id());
		assert_eq!(reconstructed.values.len(), log.len());

		let mut original_hashes: Vec<String> = log.values().into_iter().map(|e| e.hash.clone()).collect();
		let mut rebuilt_hashes: Vec<String> = reconstructed.values.iter().map(|e| e.hash.clone()).collect();
		original_hashes.sort();
		rebuilt_hashes.sort();
		assert_eq!(original_hashes, rebuilt_hashes);

		let mut original_head_hashes: Vec<String> = log.heads().into_iter().map(|e| e.hash.clone()).collect();
		let mut rebuilt_head_hashes: Vec<String> = reconstructed.heads.iter().map(|e| e.hash.clone()).collect();
		original_head_hashes.sort();
		rebuilt_head_hashes.sort();
		assert_eq!(original_head_hashes, rebuilt_head_hashes);
		assert_eq!(reconstructed.clock.time(), log.clock().time());
	}

	#[test]
	fn from_multihash_with_length_keeps_the_most_recent_entries () {
		let mut store = MemoryStore::new();
		let mut log = Log::new(LogOptions::new().id("A")).unwrap();
		for i in 0..100u32 {
			log.append(&mut store, i.to_string().as_bytes()).unwrap();
		}
		let root_hash = log.to_multihash(&mut store).unwrap();

		let reconstructed = LogIO::from_multihash(&store, &root_hash, Some(42), &HashSet::new(), None).unwrap();
		assert_eq!(reconstructed.values.len(), 42);

		let mut all: Vec<Entry> = log.values().into_iter().cloned().collect();
		all.sort_by(Entry::compare);
		let expected: HashSet<String> = all.into_iter().rev().take(42).map(|e| e.hash).collect();
		let actual: HashSet<String> = reconstructed.values.iter().map(|e| e.hash.clone()).collect();
		assert_eq!(expected, actual);
	}

	#[test]
	fn from_multihash_respects_exclude () {
		let mut store = MemoryStore::new();
		let mut log = Log::new(LogOptions::new().id("A")).unwrap();
		let one = log.append(&mut store, b"one").unwrap();
		log.append(&mut store, b"two").unwrap();
		let root_hash = log.to_multihash(&mut store).unwrap();

		let mut exclude = HashSet::new();
		exclude.insert(one.hash.clone());
		let reconstructed = LogIO::from_multihash(&store, &root_hash, None, &exclude, None).unwrap();
		assert!(reconstructed.values.iter().all(|e| e.hash != one.hash));
	}

	#[test]
	fn from_entry_hash_reconstructs_without_a_root_pointer () {
		let mut store = MemoryStore::new();
		let mut log = Log::new(LogOptions::new().id("A")).unwrap();
		log.append(&mut store, b"one").unwrap();
		let two = log.append(&mut store, b"two").unwrap();

		let reconstructed = LogIO::from_entry_hash(&store, "A", &two.hash, None, &HashSet::new(), None).unwrap();
		assert_eq!(reconstructed.values.len(), 2);
	}

	#[test]
	fn from_entry_seeds_without_refetching () {
		let mut store = MemoryStore::new();
		let root = Entry::create(&mut store, "A", b"root", &[], clock("A", 1), None).unwrap();
		let child = Entry::create(&mut store, "A", b"child", &[EntryOrHash::Entry(&root)], clock("A", 2), None).unwrap();

		let reconstructed = LogIO::from_entry(&store, "A", &child, None, &HashSet::new(), None).unwrap();
		assert_eq!(reconstructed.values.len(), 2);
		assert!(reconstructed.values.iter().any(|e| e.hash == root.hash));
	}

	#[test]
	fn expand_deepens_past_existing_tails () {
		let mut store = MemoryStore::new();
		let root = Entry::create(&mut store, "A", b"root", &[], clock("A", 1), None).unwrap();
		let child = Entry::create(&mut store, "A", b"child", &[EntryOrHash::Entry(&root)], clock("A", 2), None).unwrap();

		// `log` only knows about `child`; `root` is an open tail.
		let log = Log::new(LogOptions::new().id("A").entries(vec![child.clone()]).heads(vec![child.hash.clone()])).unwrap();
		assert_eq!(log.tail_hashes(), vec![root.hash.clone()]);

		let reconstructed = LogIO::expand(&store, &log, 2, None).unwrap();
		assert_eq!(reconstructed.values.len(), 2);
		assert!(reconstructed.values.iter().any(|e| e.hash == root.hash));
	}

	#[test]
	fn progress_callback_fires_per_fetched_entry () {
		let mut store = MemoryStore::new();
		let mut log = Log::new(LogOptions::new().id("A")).unwrap();
		log.append(&mut store, b"one").unwrap();
		log.append(&mut store, b"two").unwrap();
		let root_hash = log.to_multihash(&mut store).unwrap();

		let mut seen = Vec::new();
		{
			let mut cb = |hash: &str, _entry: &Entry, _parent: Option<&str>, depth: usize| {
				seen.push((hash.to_owned(), depth));
			};
			LogIO::from_multihash(&store, &root_hash, None, &HashSet::new(), Some(&mut cb)).unwrap();
		}
		assert_eq!(seen.len(), 2);
	}
}
