//! Typed failure kinds surfaced by [`crate::log::Log`] and [`crate::log_io`].

use thiserror::Error;

/// Every fallible operation in this crate returns one of these variants.
#[derive(Debug, Error)]
pub enum LogError {
    /// A store was required to construct a log but none was given.
    #[error("a store is required to construct a log")]
    StoreMissing,

    /// A log was required but none was given.
    #[error("a log is required")]
    LogMissing,

    /// The value handed to `join` does not present the shape of a log.
    #[error("value does not have the shape of a log")]
    NotALog,

    /// The `entries` passed to the constructor are malformed.
    #[error("entries are malformed: {0}")]
    BadEntries(String),

    /// The `heads` passed to the constructor are malformed.
    #[error("heads are malformed: {0}")]
    BadHeads(String),

    /// A hash string does not name a valid content address.
    #[error("not a valid content address: {0}")]
    InvalidHash(String),

    /// `append` was attempted by a key not present in `allowedKeys`.
    #[error("key \"{0}\" is not allowed to write to the log")]
    NotAllowedToWrite(String),

    /// An incoming entry had no `key` field during signed-mode verification.
    #[error("entry is missing a public key")]
    EntryMissingKey,

    /// An incoming entry had no `sig` field during signed-mode verification.
    #[error("entry is missing a signature")]
    EntryMissingSig,

    /// The keystore reported that a signature does not verify.
    ///
    /// Callers of `Entry::verify` see this only when the *keystore itself*
    /// fails to execute; a merely invalid signature is reported as `Ok(false)`
    /// so that `join` can drop the entry and continue (see §7 of the design
    /// notes: silent-drop vs abort).
    #[error("signature verification failed")]
    VerificationFailed,

    /// No entry exists for the requested hash.
    #[error("no entry found for hash {0}")]
    NotFound(String),

    /// The underlying store or keystore adapter failed.
    #[error("store error: {0}")]
    StoreError(String),

    /// Canonical (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
