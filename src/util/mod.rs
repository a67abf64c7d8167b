//! Free functions over a flat entry pool: heads/tails discovery (§4.6).
//!
//! These operate on `&[Entry]` rather than on `Log` itself so that `LogIO`
//! can reuse them while still assembling a `Log`.

use std::collections::HashSet;

use crate::entry::Entry;

/// Entries in `entries` that no other entry's `next` references — the DAG's
/// frontier. Sorted by `clock.id` ascending for deterministic serialization.
pub fn find_heads (entries: &[Entry]) -> Vec<Entry> {
	let mut referenced: HashSet<&str> = HashSet::new();
	for entry in entries {
		for next in &entry.next {
			referenced.insert(next.as_str());
		}
	}

	let mut heads: Vec<Entry> = entries.iter()
		.filter(|e| !referenced.contains(e.hash.as_str()))
		.cloned()
		.collect();
	heads.sort_by(|a, b| a.clock.id().cmp(b.clock.id()));
	heads
}

/// Entries that reference at least one hash not present in `entries`, or
/// that reference nothing at all — the boundary an implementation must
/// fetch across to close the graph. Sorted by `Entry::compare`.
pub fn find_tails (entries: &[Entry]) -> Vec<Entry> {
	let present: HashSet<&str> = entries.iter().map(|e| e.hash.as_str()).collect();

	let mut tails: Vec<Entry> = entries.iter()
		.filter(|e| e.next.is_empty() || e.next.iter().any(|n| !present.contains(n.as_str())))
		.cloned()
		.collect();
	tails.sort_by(Entry::compare);
	tails
}

/// The actual missing-predecessor hashes referenced by `entries` but not
/// present in them, deduplicated and sorted.
pub fn find_tail_hashes (entries: &[Entry]) -> Vec<String> {
	let present: HashSet<&str> = entries.iter().map(|e| e.hash.as_str()).collect();

	let mut hashes: Vec<String> = entries.iter()
		.flat_map(|e| e.next.iter())
		.filter(|n| !present.contains(n.as_str()))
		.cloned()
		.collect();
	hashes.sort();
	hashes.dedup();
	hashes
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::entry::EntryOrHash;
	use crate::lamport_clock::LamportClock;
	use crate::store::MemoryStore;

	fn clock (id: &str, time: u64) -> LamportClock {
		LamportClock::new(id).with_time(time)
	}

	#[test]
	fn find_heads_returns_unreferenced_entries () {
		let mut store = MemoryStore::new();
		let root = crate::entry::Entry::create(&mut store, "log", b"root", &[], clock("log", 1), None).unwrap();
		let child = crate::entry::Entry::create(&mut store, "log", b"child", &[EntryOrHash::Entry(&root)], clock("log", 2), None).unwrap();

		let heads = find_heads(&[root.clone(), child.clone()]);
		assert_eq!(heads.len(), 1);
		assert_eq!(heads[0].hash, child.hash);
	}

	#[test]
	fn find_tails_reports_open_edges () {
		let mut store = MemoryStore::new();
		let root = crate::entry::Entry::create(&mut store, "log", b"root", &[], clock("log", 1), None).unwrap();
		let child = crate::entry::Entry::create(&mut store, "log", b"child", &[EntryOrHash::Entry(&root)], clock("log", 2), None).unwrap();

		// Only `child` is present: its reference to `root` is an open tail.
		let tails = find_tails(&[child.clone()]);
		assert_eq!(tails.len(), 1);
		assert_eq!(tails[0].hash, child.hash);

		let tail_hashes = find_tail_hashes(&[child.clone()]);
		assert_eq!(tail_hashes, vec![root.hash.clone()]);
	}

	#[test]
	fn empty_pool_has_no_heads_or_tails () {
		assert!(find_heads(&[]).is_empty());
		assert!(find_tails(&[]).is_empty());
		assert!(find_tail_hashes(&[]).is_empty());
	}
}
