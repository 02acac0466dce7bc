//! Listener lifecycle.
//!
//! The [`Supervisor`] binds every configured DNS and hook API address, runs each listener in its
//! own task and stops them all together. Startup is all or nothing: if one address can't be
//! bound, the listeners already started are stopped before the error is returned.

use crate::config::Config;
use crate::error::Error;
use crate::txt_store::DynTxtStore;
use crate::{api, dns};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use trust_dns_server::server::RequestHandler;
use trust_dns_server::ServerFuture;

pub struct Supervisor {
    shutdown: CancellationToken,
    listeners: JoinSet<Result<(), Error>>,
    dns_addrs: Vec<SocketAddr>,
    hook_addrs: Vec<SocketAddr>,
    drain_timeout: Duration,
}

impl Supervisor {
    /// Bind and start every listener named by `config`, all sharing `txt_store`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] for the first address that can't be bound, after stopping the
    /// listeners started before it.
    pub async fn start(config: &Config, txt_store: DynTxtStore) -> Result<Self, Error> {
        let mut supervisor = Supervisor {
            shutdown: CancellationToken::new(),
            listeners: JoinSet::new(),
            dns_addrs: Vec::default(),
            hook_addrs: Vec::default(),
            drain_timeout: config.hook_timeout,
        };
        if let Err(err) = supervisor.start_listeners(config, txt_store).await {
            tracing::error!(
                "startup failed, stopping {} started listener(s)",
                supervisor.listeners.len()
            );
            if let Err(stop_err) = supervisor.stop().await {
                tracing::warn!("error stopping listeners: {stop_err}");
            }
            return Err(err);
        }
        Ok(supervisor)
    }

    async fn start_listeners(
        &mut self,
        config: &Config,
        txt_store: DynTxtStore,
    ) -> Result<(), Error> {
        let config = Arc::new(config.clone());

        for addr in config.dns_addrs.iter() {
            let (server, local_addr) = dns::new(
                addr,
                config.dns_tcp_timeout,
                config.txt_ttl,
                txt_store.clone(),
            )
            .await?;
            tracing::info!("DNS listening on UDP and TCP {local_addr}");
            self.listeners
                .spawn(run_dns(server, local_addr, self.shutdown.clone()));
            self.dns_addrs.push(local_addr);
        }

        for addr in config.hook_addrs.iter() {
            let shutdown = self.shutdown.clone();
            let graceful = async move { shutdown.cancelled().await };
            let (server, local_addr) =
                api::new(addr, config.clone(), txt_store.clone(), graceful).await?;
            tracing::info!("hook API listening on {local_addr}");
            self.listeners
                .spawn(run_hook_api(server, local_addr, self.shutdown.clone()));
            self.hook_addrs.push(local_addr);
        }
        Ok(())
    }

    /// Bound DNS addresses, each serving UDP and TCP.
    #[must_use]
    pub fn dns_addrs(&self) -> &[SocketAddr] {
        &self.dns_addrs
    }

    /// Bound hook API addresses.
    #[must_use]
    pub fn hook_addrs(&self) -> &[SocketAddr] {
        &self.hook_addrs
    }

    /// Serve until `shutdown` resolves, then stop every listener.
    ///
    /// # Errors
    ///
    /// A listener exiting before `shutdown` resolves is fatal: the rest are stopped and its error
    /// is returned.
    pub async fn run_until<F: Future<Output = ()>>(mut self, shutdown: F) -> Result<(), Error> {
        let outcome = tokio::select! {
            () = shutdown => {
                tracing::info!("shutdown requested");
                Ok(())
            }
            Some(res) = self.listeners.join_next() => {
                let res = flatten(res);
                if let Err(err) = &res {
                    tracing::error!("listener failed: {err}");
                }
                res
            }
        };
        let stopped = self.stop().await;
        outcome.and(stopped)
    }

    /// Stop every listener and wait for them to finish. Hook API listeners get up to the hook
    /// timeout to complete their in-flight requests; whatever is still running then is aborted.
    ///
    /// # Errors
    ///
    /// Returns the first error a listener finished with.
    pub async fn stop(mut self) -> Result<(), Error> {
        self.shutdown.cancel();
        let mut first_err = None;
        let listeners = &mut self.listeners;
        let drained = tokio::time::timeout(self.drain_timeout, async {
            while let Some(res) = listeners.join_next().await {
                if let Err(err) = flatten(res) {
                    tracing::warn!("listener stopped with error: {err}");
                    first_err.get_or_insert(err);
                }
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!(
                "{} listener(s) still draining after {:?}, aborting",
                self.listeners.len(),
                self.drain_timeout
            );
            self.listeners.shutdown().await;
        }
        tracing::info!("all listeners stopped");
        first_err.map_or(Ok(()), Err)
    }
}

fn flatten(res: Result<Result<(), Error>, JoinError>) -> Result<(), Error> {
    res.map_err(Error::from).and_then(|res| res)
}

async fn run_dns<T: RequestHandler>(
    server: ServerFuture<T>,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<(), Error> {
    tokio::select! {
        res = server.block_until_done() => {
            res?;
            Err(Error::ListenerExited { kind: "DNS", addr: addr.to_string() })
        }
        // Dropping the server future closes its sockets.
        () = shutdown.cancelled() => Ok(()),
    }
}

async fn run_hook_api(
    server: impl Future<Output = hyper::Result<()>>,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<(), Error> {
    server.await?;
    if shutdown.is_cancelled() {
        Ok(())
    } else {
        Err(Error::ListenerExited {
            kind: "hook API",
            addr: addr.to_string(),
        })
    }
}
