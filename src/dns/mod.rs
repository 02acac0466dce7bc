//! TXT-only authoritative DNS server.
//!
//! hookcrab answers `TXT` queries for any name that has a value in the
//! [TXT store][crate::txt_store], i.e. every `_acme-challenge.<domain>` provisioned through the
//! [hook API][crate::api]. Names match regardless of letter case or a trailing dot, and the answer
//! echoes the query name exactly as asked.
//!
//! E.g. after an `add` hook for `example.com` with key authorization `abc123`:
//!
//! ```bash
//! ❯ dig @127.0.0.1 -p 5353 +short _acme-challenge.example.com TXT
//! "abc123"
//! ```
//!
//! Every response is authoritative, never offers recursion, and carries `NOERROR`. A `TXT` query
//! for a name with no value, or a query of any other type (`A`, `NS`, `SOA`, ...), gets an empty
//! `NOERROR` answer: callers can't tell "not provisioned yet" from "not served here", and which
//! names are provisioned isn't disclosed. Messages that aren't queries get `NOTIMP`.
//!
//! Each configured address is served over both UDP and TCP. A UDP answer that doesn't fit the
//! client's payload size (512 bytes, or its EDNS size) is sent without records and with `TC` set,
//! so the resolver retries over TCP.

mod handlers;
pub mod server;

pub use server::new;
