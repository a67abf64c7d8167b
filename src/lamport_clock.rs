//! A hybrid Lamport clock: `(id, time)`, compared lexicographically on
//! `(time, id)` to give every pair of entries a deterministic total order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LamportClock {
	id: String,
	time: u64,
}

impl LamportClock {
	pub fn new(id: &str) -> LamportClock {
		LamportClock {
			id: id.to_owned(),
			time: 0,
		}
	}

	/// Consumes `self` and returns a clock with the same id and `time` set.
	pub fn with_time(mut self, time: u64) -> LamportClock {
		self.time = time;
		self
	}

	pub fn time(&self) -> u64 {
		self.time
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	/// Returns a new clock, one tick ahead of `self`.
	pub fn tick(&self) -> LamportClock {
		LamportClock {
			id: self.id.clone(),
			time: self.time + 1,
		}
	}

	/// Returns a new clock carrying the same id and the later of the two times.
	pub fn merge(&self, other: &LamportClock) -> LamportClock {
		LamportClock {
			id: self.id.clone(),
			time: self.time.max(other.time),
		}
	}
}

impl PartialEq for LamportClock {
	fn eq(&self, other: &Self) -> bool {
		self.time == other.time && self.id == other.id
	}
}

impl Eq for LamportClock {}

impl Ord for LamportClock {
	fn cmp(&self, other: &Self) -> Ordering {
		self.time.cmp(&other.time).then_with(|| self.id.cmp(&other.id))
	}
}

impl PartialOrd for LamportClock {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn orders_by_time_first() {
		let a = LamportClock::new("b").with_time(1);
		let b = LamportClock::new("a").with_time(2);
		assert!(a < b);
	}

	#[test]
	fn breaks_ties_by_id() {
		let a = LamportClock::new("a").with_time(5);
		let b = LamportClock::new("b").with_time(5);
		assert!(a < b);
		assert!(b > a);
	}

	#[test]
	fn tick_advances_by_one() {
		let a = LamportClock::new("a").with_time(4);
		let b = a.tick();
		assert_eq!(b.time(), 5);
		assert_eq!(b.id(), "a");
	}

	#[test]
	fn merge_takes_the_larger_time() {
		let a = LamportClock::new("a").with_time(2);
		let b = LamportClock::new("b").with_time(9);
		let merged = a.merge(&b);
		assert_eq!(merged.time(), 9);
		assert_eq!(merged.id(), "a");
	}

	#[test]
	fn equal_when_time_and_id_match() {
		let a = LamportClock::new("a").with_time(3);
		let b = LamportClock::new("a").with_time(3);
		assert_eq!(a, b);
	}
}
