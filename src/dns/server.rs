use crate::dns::handlers::Handler;
use crate::error::Error;
use crate::txt_store::DynTxtStore;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use trust_dns_server::ServerFuture;

/// Bind a UDP socket and a TCP listener on `addr`, both answering from `txt_store`.
///
/// The TCP listener binds the exact address the UDP socket ended up on, so a `:0` port yields one
/// ephemeral port shared by both transports. Returns the server and that address.
pub async fn new(
    addr: &str,
    tcp_timeout: Duration,
    txt_ttl: u32,
    txt_store: DynTxtStore,
) -> Result<(ServerFuture<Handler>, SocketAddr), Error> {
    let bind_err = |source| Error::Bind {
        kind: "DNS",
        addr: addr.to_string(),
        source,
    };
    let udp_socket = UdpSocket::bind(addr).await.map_err(bind_err)?;
    let local_addr = udp_socket.local_addr().map_err(bind_err)?;
    let tcp_listener = TcpListener::bind(local_addr).await.map_err(bind_err)?;

    let mut dns_server = ServerFuture::new(Handler::new(txt_store, txt_ttl));
    dns_server.register_socket(udp_socket);
    dns_server.register_listener(tcp_listener, tcp_timeout);
    Ok((dns_server, local_addr))
}
