//! HTTP API for the ACME hook of the reverse proxy, adding and removing challenge TXT records.
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/hook` (POST)
//!
//!   Expects an `application/x-www-form-urlencoded` body carrying the hook variables:
//!
//!   | parameter        | `add`    | `remove` |
//!   |------------------|----------|----------|
//!   | `ACME_HOOK`      | required | required |
//!   | `ACME_DOMAIN`    | required | required |
//!   | `ACME_KEYAUTH`   | required | ignored  |
//!   | `ACME_CLIENT`    | logged   | logged   |
//!   | `ACME_CHALLENGE` | logged   | logged   |
//!   | `ACME_TOKEN`     | logged   | logged   |
//!
//!  Both hooks act on the challenge name `_acme-challenge.<ACME_DOMAIN>.` (a leading `*.` of a
//!  wildcard domain is dropped). `add` publishes `ACME_KEYAUTH` as its TXT value, replacing any
//!  previous one; `remove` deletes it, succeeding whether or not it existed.
//!
//!  ```bash
//!  ❯ curl -d ACME_HOOK=add -d ACME_DOMAIN=example.com -d ACME_KEYAUTH=abc123 \
//!      http://127.0.0.1:9000/hook
//!  {"record":"_acme-challenge.example.com.","message":"TXT record added: _acme-challenge.example.com. -> abc123"}
//!  ```
//!
//!  Missing or empty required parameters and unknown `ACME_HOOK` values get HTTP 400 (Bad
//!  Request) with a body of the form `{"error": "..."}`, and leave the records untouched. Calls
//!  from outside a configured [`Config::hook_acl`][`crate::config::Config::hook_acl`] get HTTP
//!  403 (Forbidden).

mod api_error;
mod model;
mod routes;
pub mod server;

pub use server::new;
