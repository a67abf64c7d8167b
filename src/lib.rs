//! An append-only, eventually-consistent log CRDT: a grow-only set of
//! immutable entries forming a causal DAG, with a hybrid Lamport clock
//! giving every replica the same deterministic linearization once entries
//! converge (§1).
//!
//! The core types are [`Log`] (append/join/heads/tails) and [`Entry`] (the
//! DAG node); [`LogIO`] reconstructs a `Log` from a root hash or an existing
//! log that needs deepening. `Log` and `Entry` reach the outside world only
//! through the [`store::EntryStore`] and [`keystore::SignatureAdapter`]
//! traits — this crate ships in-memory reference implementations of both
//! ([`store::MemoryStore`], [`keystore::Keyring`]) so it is testable without
//! an external content-addressed store or keystore.

pub mod entry;
pub mod error;
pub mod gset;
pub mod keystore;
pub mod lamport_clock;
pub mod log;
pub mod log_io;
pub mod log_options;
pub mod store;
mod util;

pub use entry::{Entry, EntryOrHash};
pub use error::LogError;
pub use gset::GSet;
pub use keystore::{Keypair, Keyring, SignatureAdapter};
pub use lamport_clock::LamportClock;
pub use log::Log;
pub use log_io::{LogIO, ProgressCallback, Reconstruction};
pub use log_options::{LogOptions, ANY_KEY};
pub use store::{EntryStore, MemoryStore};
