use crate::api::routes;
use crate::config::SharedConfig;
use crate::error::Error;
use crate::txt_store::DynTxtStore;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: SharedConfig,
    pub txt_store: DynTxtStore,
}

/// Bind the hook API on `addr`. The returned server runs until `shutdown` resolves, then stops
/// accepting connections and finishes in-flight requests. Returns the server and its bound
/// address.
pub async fn new<F>(
    addr: &str,
    config: SharedConfig,
    txt_store: DynTxtStore,
    shutdown: F,
) -> Result<(impl Future<Output = hyper::Result<()>>, SocketAddr), Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_err = |source| Error::Bind {
        kind: "hook API",
        addr: addr.to_string(),
        source,
    };
    let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
    let local_addr = listener.local_addr().map_err(bind_err)?;
    // Bounds a peer that never finishes its headers; such a connection would otherwise hold
    // graceful shutdown open forever.
    let header_timeout = config.hook_timeout;
    let server = axum::Server::from_tcp(listener.into_std().map_err(bind_err)?)?
        .http1_header_read_timeout(header_timeout)
        .serve(
            routes::new(AppState { config, txt_store })
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown);
    Ok((server, local_addr))
}
