use crate::error::Error;
use ipnetwork::IpNetwork;
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, DurationSeconds};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub type SharedConfig = Arc<Config>;

/// Runtime configuration, loaded from a JSON file. Every key is optional.
///
/// ```json
/// {
///   "dns_addrs": "0.0.0.0:53,[::]:53",
///   "hook_addrs": "127.0.0.1:9000",
///   "dns_tcp_timeout": 10,
///   "hook_timeout": 10,
///   "txt_ttl": 300,
///   "hook_acl": ["127.0.0.0/8", "::1/128"]
/// }
/// ```
#[serde_as]
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Addresses to answer DNS queries on. Each gets a UDP socket and a TCP listener.
    #[serde_as(as = "DisplayFromStr")]
    pub dns_addrs: ListenAddrs,
    /// Addresses to serve the [hook API][crate::api] on.
    #[serde_as(as = "DisplayFromStr")]
    pub hook_addrs: ListenAddrs,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub dns_tcp_timeout: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub hook_timeout: Duration,
    /// TTL of served TXT answers. Only affects downstream caching, records never expire here.
    pub txt_ttl: u32,
    /// Networks allowed to call the hook API. Empty allows any source.
    pub hook_acl: Vec<IpNetwork>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dns_addrs: ListenAddrs(vec!["0.0.0.0:53".to_string()]),
            hook_addrs: ListenAddrs(vec!["127.0.0.1:9000".to_string()]),
            dns_tcp_timeout: Duration::from_secs(10),
            hook_timeout: Duration::from_secs(10),
            txt_ttl: 300,
            hook_acl: Vec::default(),
        }
    }
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.txt_ttl == 0 {
            return Err(Error::InvalidConfig("txt_ttl must be positive"));
        }
        if self.dns_tcp_timeout.is_zero() || self.hook_timeout.is_zero() {
            return Err(Error::InvalidConfig("timeouts must be positive"));
        }
        Ok(())
    }

    pub fn hook_permitted(&self, source_ip: IpAddr) -> bool {
        self.hook_acl.is_empty()
            || self
                .hook_acl
                .iter()
                .any(|allowed_network| allowed_network.contains(source_ip))
    }
}

/// One or more `host:port` listen addresses, written comma-separated (`"0.0.0.0:53,[::]:53"`).
///
/// Hosts are kept as written and resolved when binding, so names like `localhost:5353` work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddrs(Vec<String>);

impl ListenAddrs {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromStr for ListenAddrs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why| Error::InvalidListenAddrs(s.to_string(), why);
        let mut addrs = Vec::default();
        for entry in s.split(',').map(str::trim) {
            if entry.is_empty() {
                return Err(invalid("empty address"));
            }
            match entry.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() => {
                    port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
                }
                _ => return Err(invalid("expected host:port")),
            }
            addrs.push(entry.to_string());
        }
        Ok(ListenAddrs(addrs))
    }
}

impl fmt::Display for ListenAddrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}
