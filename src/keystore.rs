//! Signing identities and the keystore adapter entries are verified against
//! (§6 "Keystore adapter", §6a reference adapters).
//!
//! The log never touches a private key itself: `append` holds an optional
//! [`Keypair`] capable of signing on the log owner's behalf, and `join`
//! verifies incoming entries through a [`SignatureAdapter`] reached via
//! [`crate::store::EntryStore::keystore`]. This crate ships `secp256k1`-backed
//! reference implementations of both so the library is testable standalone.

use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, Signature};
use sha2::{Digest, Sha256};

use crate::error::LogError;

/// Verifies signatures on behalf of a log. Implementations never need the
/// private key: verification is a pure function of the public identity, the
/// signature, and the signed bytes.
pub trait SignatureAdapter {
	/// Returns `Ok(true)` iff `sig` is a valid signature over `bytes` under `key`.
	///
	/// A malformed `key`/`sig` is reported as `Ok(false)`, not `Err`, so that
	/// `Log::join` can drop a corrupt entry and continue rather than aborting
	/// (see the design notes on silent-drop vs abort).
	fn verify (&self, key: &str, sig: &str, bytes: &[u8]) -> Result<bool, LogError>;
}

/// The reference `SignatureAdapter`: secp256k1 signatures over a SHA-256
/// digest of the canonical bytes, hex-encoded at the wire boundary.
#[derive(Debug, Default, Clone, Copy)]
pub struct Keyring;

impl Keyring {
	fn digest (bytes: &[u8]) -> Result<Message, secp256k1::Error> {
		let hashed = Sha256::digest(bytes);
		Message::from_slice(&hashed)
	}
}

impl SignatureAdapter for Keyring {
	fn verify (&self, key: &str, sig: &str, bytes: &[u8]) -> Result<bool, LogError> {
		let outcome: Result<bool, secp256k1::Error> = (|| {
			let key_bytes = hex::decode(key).map_err(|_| secp256k1::Error::InvalidPublicKey)?;
			let sig_bytes = hex::decode(sig).map_err(|_| secp256k1::Error::InvalidSignature)?;
			let public = PublicKey::from_slice(&key_bytes)?;
			let signature = Signature::from_compact(&sig_bytes)?;
			let message = Keyring::digest(bytes)?;
			let secp = Secp256k1::verification_only();
			Ok(secp.verify(&message, &signature, &public).is_ok())
		})();
		Ok(outcome.unwrap_or(false))
	}
}

/// A single secp256k1 signing identity: the private half used by `append`,
/// and the hex-encoded public half that becomes an `Entry::key` and an
/// `allowedKeys` member.
#[derive(Clone)]
pub struct Keypair {
	secret: SecretKey,
	public: PublicKey,
}

impl Keypair {
	/// Generates a new random keypair.
	pub fn generate () -> Keypair {
		let secp = Secp256k1::new();
		let (secret, public) = secp.generate_keypair(&mut rand::thread_rng());
		Keypair { secret, public }
	}

	/// Reconstructs a keypair from a 32-byte secret.
	pub fn from_secret_bytes (bytes: &[u8]) -> Result<Keypair, LogError> {
		let secret = SecretKey::from_slice(bytes)
			.map_err(|e| LogError::StoreError(e.to_string()))?;
		let secp = Secp256k1::new();
		let public = PublicKey::from_secret_key(&secp, &secret);
		Ok(Keypair { secret, public })
	}

	/// The canonical hex encoding of the compressed public key; this is what
	/// `Entry::key` and `allowedKeys` entries hold (§3, §6).
	pub fn public_identity (&self) -> String {
		hex::encode(self.public.serialize())
	}

	/// Signs `bytes`, returning a hex-encoded compact signature.
	pub fn sign (&self, bytes: &[u8]) -> Result<String, LogError> {
		let secp = Secp256k1::signing_only();
		let message = Keyring::digest(bytes).map_err(|e| LogError::StoreError(e.to_string()))?;
		let sig = secp.sign(&message, &self.secret);
		Ok(hex::encode(sig.serialize_compact().to_vec()))
	}
}

impl std::fmt::Debug for Keypair {
	fn fmt (&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Keypair").field("public", &self.public_identity()).finish()
	}
}
