//! Error types.

use std::net::IpAddr;
use trust_dns_server::proto::error::ProtoError;

/// Error enumerates the possible hookcrab error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a [`/hook` call][crate::api#hook-post] omits a parameter required by its
    /// hook kind, or sends it empty.
    #[error("{0} is required")]
    MissingParam(&'static str),

    /// Returned when a [`/hook` call][crate::api#hook-post] names a hook kind other than `add` or
    /// `remove`.
    #[error("unknown hook: \"{0}\"")]
    UnknownHook(String),

    /// Returned when a [`/hook` call][crate::api#hook-post] arrives from a source IP address
    /// outside every network of a non-empty
    /// [`Config::hook_acl`][`crate::config::Config::hook_acl`].
    #[error("IP {0} is not authorized to call hooks")]
    Forbidden(IpAddr),

    /// Returned when a comma-separated listen address list is empty or has an entry that isn't
    /// a `host:port` pair.
    #[error("invalid listen address list \"{0}\": {1}")]
    InvalidListenAddrs(String, &'static str),

    /// Returned when a loaded [`Config`][crate::config::Config] has an out of range value.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),

    /// Returned by the [`Supervisor`][crate::supervisor::Supervisor] when a listener can't be
    /// bound. Startup is aborted and already started listeners are stopped.
    #[error("failed to bind {kind} listener on {addr}")]
    Bind {
        kind: &'static str,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Returned by the [`Supervisor`][crate::supervisor::Supervisor] when a listener stops before
    /// shutdown was requested.
    #[error("{kind} listener on {addr} exited unexpectedly")]
    ListenerExited { kind: &'static str, addr: String },

    /// Returned by the [`Supervisor`][crate::supervisor::Supervisor] when a listener task panics.
    #[error("listener task failed")]
    Join(#[from] tokio::task::JoinError),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when [trying to load a `Config`][crate::config::Config::try_from_file] fails due to
    /// invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),

    /// Returned when the hookcrab DNS server encounters a generic DNS protocol error.
    #[error("DNS error")]
    DNSError(#[from] ProtoError),

    /// Returned when a control plane HTTP listener fails.
    #[error("HTTP error")]
    Http(#[from] hyper::Error),
}
