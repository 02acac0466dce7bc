//! Dynamic TXT record storage.
//!
//! Holds at most one TXT value per domain name: the [RFC-8555][RFC-8555] [DNS-01] key
//! authorization most recently published for it by the [hook API][crate::api], served back by the
//! [DNS server][crate::dns].
//!
//! Names are canonicalized with [`normalize_name`] on every write and every read, so a record
//! stored as `_acme-challenge.Example.COM.` is found when querying `_acme-challenge.example.com`.
//!
//! State is not durable: a restart discards every record. Challenges are short-lived and
//! re-issued on demand, so nothing is lost that a client won't publish again.
//!
//! [RFC-8555]: https://www.rfc-editor.org/rfc/rfc8555
//! [DNS-01]: https://www.rfc-editor.org/rfc/rfc8555#section-8.4

use std::sync::Arc;

pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryTxtStore;

/// `DynTxtStore` is a type alias for a [`TxtStore`] shared by the DNS and hook API listeners.
/// Implementations do their own locking.
#[allow(clippy::module_name_repetitions)]
pub type DynTxtStore = Arc<dyn TxtStore + Send + Sync>;

/// Storage of TXT record values keyed by the domain name they should be served for in the
/// [DNS API][crate::dns].
///
/// Every method normalizes its `domain` argument with [`normalize_name`].
pub trait TxtStore {
    /// Set the TXT value for the given domain, replacing any previous value.
    fn set_txt(&self, domain: &str, value: String);

    /// Remove the TXT value for the given domain. Removing an absent record is a no-op.
    fn clear_txt(&self, domain: &str);

    /// Get the TXT value for the given domain (if any).
    fn get_txt(&self, domain: &str) -> Option<String>;

    /// Number of domains with a TXT value.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical form of a domain name used as a store key: surrounding whitespace trimmed, ASCII
/// letters lower-cased, trailing root label(s) removed.
#[must_use]
pub fn normalize_name(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}
