use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::iter::FromIterator;

/// A Grow-only Set: elements can be inserted but never removed. Used directly
/// by [`crate::log::Log`] as the `allowedKeys` permission set (§3, §4.4):
/// a set of signer identities only ever grows as a log's configuration is
/// extended, never shrinks at runtime.
#[derive(Debug, Clone)]
pub struct GSet<T: Eq + Ord + Clone> {
	set: BTreeSet<T>,
}

impl<T: Eq + Ord + Clone> GSet<T> {
	pub fn new () -> GSet<T> {
		GSet {
			set: BTreeSet::new(),
		}
	}

	pub fn insert (&mut self, value: T) -> bool {
		self.set.insert(value)
	}

	pub fn get<Q> (&self, value: &Q) -> Option<&T>
	where Q: Ord + ?Sized, T: Borrow<Q> {
		self.set.get(value)
	}

	pub fn contains<Q> (&self, value: &Q) -> bool
	where Q: Ord + ?Sized, T: Borrow<Q> {
		self.set.contains(value)
	}

	pub fn len (&self) -> usize {
		self.set.len()
	}

	pub fn is_empty (&self) -> bool {
		self.set.is_empty()
	}

	pub fn is_subset (&self, o: &GSet<T>) -> bool {
		self.set.is_subset(&o.set)
	}

	pub fn iter (&self) -> impl Iterator<Item = &T> {
		self.set.iter()
	}

	pub fn union (a: &GSet<T>, b: &GSet<T>) -> GSet<T> {
		let mut c = GSet::new();
		c.set = a.set.union(&b.set).cloned().collect();
		c
	}
}

impl<T: Eq + Ord + Clone> Default for GSet<T> {
	fn default () -> Self {
		GSet::new()
	}
}

impl<T: Eq + Ord + Clone> FromIterator<T> for GSet<T> {
	fn from_iter<I: IntoIterator<Item = T>> (iter: I) -> Self {
		let mut g = GSet::new();
		for value in iter {
			g.insert(value);
		}
		g
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_gset () {
		let mut x: GSet<i32> = GSet::new();
		assert!(x.is_empty());
		x.insert(2);
		x.insert(3);
		x.insert(5);
		x.insert(8);
		assert!(!x.is_empty());
		assert_eq!(x.len(),4);
		let mut y: GSet<i32> = GSet::new();
		y.insert(4);
		y.insert(5);
		y.insert(10);
		y.insert(12);
		assert!(!x.is_subset(&y));
		assert!(!y.is_subset(&x));
		let z = GSet::union(&x,&y);
		assert_eq!(z.len(),7);
		let mut w = GSet::new();
		w.insert(2);
		w.insert(4);
		w.insert(8);
		assert!(w.is_subset(&z));
		assert!(!z.is_subset(&w));
	}

	#[test]
	fn collects_from_iterator () {
		let g: GSet<String> = vec!["a".to_owned(), "b".to_owned(), "a".to_owned()].into_iter().collect();
		assert_eq!(g.len(), 2);
		assert!(g.contains("a"));
	}
}
