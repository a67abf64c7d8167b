//! Configuration surface for constructing a [`crate::log::Log`] (§4.3, §2a).
//!
//! `LogOptions::new()` creates default options: no identifier (one is
//! generated), no entries, no heads, no Lamport clock, unsigned, nobody
//! allowed to write. Use method chaining to set what you need:
//!
//! ```ignore
//! let opts = LogOptions::new().id("some_id").own_key(keypair).allow_any();
//! let log = Log::new(opts)?;
//! ```

use crate::entry::Entry;
use crate::gset::GSet;
use crate::keystore::Keypair;
use crate::lamport_clock::LamportClock;

/// The `allowedKeys` sentinel meaning "any signer may append" (§3).
pub const ANY_KEY: &str = "*";

#[derive(Debug, Default)]
pub struct LogOptions {
	id: Option<String>,
	entries: Vec<Entry>,
	heads: Vec<String>,
	clock: Option<LamportClock>,
	own_key: Option<Keypair>,
	allowed_keys: GSet<String>,
}

/// The fields of a `LogOptions`, unpacked for `Log::new` to consume by value.
pub(crate) struct LogOptionsParts {
	pub id: Option<String>,
	pub entries: Vec<Entry>,
	pub heads: Vec<String>,
	pub clock: Option<LamportClock>,
	pub own_key: Option<Keypair>,
	pub allowed_keys: GSet<String>,
}

impl LogOptions {
	/// Constructs default log options.
	pub fn new () -> LogOptions {
		LogOptions::default()
	}

	/// Sets the identifier for the constructed log. If left unset, `Log::new`
	/// generates one.
	pub fn id (mut self, id: &str) -> LogOptions {
		self.id = Some(id.to_owned());
		self
	}

	/// Seeds the log with pre-existing entries, e.g. when reconstructing
	/// from a [`crate::log_io::LogIO`] fetch.
	pub fn entries (mut self, es: Vec<Entry>) -> LogOptions {
		self.entries = es;
		self
	}

	/// Seeds the log's heads explicitly; if left empty, `Log::new` computes
	/// them from `entries` via `find_heads`.
	pub fn heads (mut self, hs: Vec<String>) -> LogOptions {
		self.heads = hs;
		self
	}

	/// Seeds the log's Lamport clock.
	pub fn clock (mut self, clock: LamportClock) -> LogOptions {
		self.clock = Some(clock);
		self
	}

	/// Sets the signing identity `append` uses. Leaving this unset puts the
	/// log in unsigned mode: `append` performs no access check and produces
	/// unsigned entries.
	pub fn own_key (mut self, key: Keypair) -> LogOptions {
		self.own_key = Some(key);
		self
	}

	/// Allows a single signer identity (hex public key) to append.
	pub fn allow (mut self, public_identity: &str) -> LogOptions {
		self.allowed_keys.insert(public_identity.to_owned());
		self
	}

	/// Allows several signer identities to append.
	pub fn allow_many<I: IntoIterator<Item = String>> (mut self, keys: I) -> LogOptions {
		for key in keys {
			self.allowed_keys.insert(key);
		}
		self
	}

	/// Allows any signer to append (the `*` sentinel, §3).
	pub fn allow_any (mut self) -> LogOptions {
		self.allowed_keys.insert(ANY_KEY.to_owned());
		self
	}

	pub fn get_id (&self) -> Option<&str> {
		self.id.as_deref()
	}

	pub fn get_clock (&self) -> Option<&LamportClock> {
		self.clock.as_ref()
	}

	pub fn get_entries (&self) -> &[Entry] {
		&self.entries
	}

	pub fn get_heads (&self) -> &[String] {
		&self.heads
	}

	pub(crate) fn into_parts (self) -> LogOptionsParts {
		LogOptionsParts {
			id: self.id,
			entries: self.entries,
			heads: self.heads,
			clock: self.clock,
			own_key: self.own_key,
			allowed_keys: self.allowed_keys,
		}
	}
}
