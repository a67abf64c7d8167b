//! The content-addressed block store the log treats as an external
//! collaborator (§6 "Store adapter"). `Log` and `LogIO` only ever reach it
//! through the `EntryStore` trait, so a caller can swap in an IPFS client or
//! any other backend without touching the CRDT core.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::error::LogError;
use crate::keystore::{Keyring, SignatureAdapter};

/// Persists and retrieves opaque, content-addressed blobs, and exposes the
/// keystore used to verify incoming signatures.
pub trait EntryStore {
	/// Content-addresses and persists `bytes`, returning a stable digest.
	fn put (&mut self, bytes: &[u8]) -> Result<String, LogError>;

	/// Retrieves previously stored content, failing with `LogError::NotFound`
	/// when `hash` names nothing this store has seen.
	fn get (&self, hash: &str) -> Result<Vec<u8>, LogError>;

	/// The keystore used to verify signatures on entries fetched from this store.
	fn keystore (&self) -> &dyn SignatureAdapter;
}

/// The reference `EntryStore`: a `HashMap` keyed by the hex-encoded SHA-256
/// digest of the stored bytes, paired with a `Keyring` for verification.
#[derive(Debug, Default)]
pub struct MemoryStore {
	blocks: HashMap<String, Vec<u8>>,
	keyring: Keyring,
}

impl MemoryStore {
	pub fn new () -> MemoryStore {
		MemoryStore::default()
	}

	pub fn len (&self) -> usize {
		self.blocks.len()
	}

	pub fn is_empty (&self) -> bool {
		self.blocks.is_empty()
	}
}

impl EntryStore for MemoryStore {
	fn put (&mut self, bytes: &[u8]) -> Result<String, LogError> {
		let hash = hex::encode(Sha256::digest(bytes));
		self.blocks.insert(hash.clone(), bytes.to_owned());
		Ok(hash)
	}

	fn get (&self, hash: &str) -> Result<Vec<u8>, LogError> {
		self.blocks.get(hash).cloned().ok_or_else(|| LogError::NotFound(hash.to_owned()))
	}

	fn keystore (&self) -> &dyn SignatureAdapter {
		&self.keyring
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn put_then_get_round_trips () {
		let mut store = MemoryStore::new();
		let hash = store.put(b"hello").unwrap();
		assert_eq!(store.get(&hash).unwrap(), b"hello");
	}

	#[test]
	fn put_is_content_addressed () {
		let mut store = MemoryStore::new();
		let h1 = store.put(b"same").unwrap();
		let h2 = store.put(b"same").unwrap();
		assert_eq!(h1, h2);
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn get_missing_hash_fails () {
		let store = MemoryStore::new();
		assert!(matches!(store.get("deadbeef"), Err(LogError::NotFound(_))));
	}
}
