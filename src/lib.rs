//! hookcrab
//!
//! A TXT-only authoritative DNS server for [RFC-8555][RFC-8555] [DNS-01] challenges, fed by the
//! ACME hook of a reverse proxy issuing its own certificates.
//!
//! The proxy calls the [hook API][api] when a challenge starts (`add`) and when it is done
//! (`remove`); hookcrab publishes the key authorization under `_acme-challenge.<domain>` in its
//! [DNS server][dns] meanwhile. Delegate `_acme-challenge.<domain>` to hookcrab with an NS record
//! and the CA's lookups land on it.
//!
//! Records live in memory only; see [`txt_store`].
//!
//! [RFC-8555]: https://www.rfc-editor.org/rfc/rfc8555
//! [DNS-01]: https://www.rfc-editor.org/rfc/rfc8555#section-8.4
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod config;
pub mod dns;
pub mod error;
pub mod supervisor;
pub mod txt_store;

pub use api::new as new_http;
pub use config::{Config, ListenAddrs, SharedConfig};
pub use dns::new as new_dns;
pub use supervisor::Supervisor;
pub use txt_store::{DynTxtStore, InMemoryTxtStore, TxtStore};
