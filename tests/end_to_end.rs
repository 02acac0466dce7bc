//! Drives a running [`Supervisor`] the way the reverse proxy and a CA would: hook calls over HTTP,
//! TXT lookups over real DNS on UDP and TCP.

use hookcrab::{Config, DynTxtStore, InMemoryTxtStore, Supervisor, TxtStore};
use hyper::{Body, Client, Request, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpStream, UdpSocket};
use trust_dns_client::client::{AsyncClient, ClientHandle};
use trust_dns_client::op::{Message, Query, ResponseCode};
use trust_dns_client::rr::{DNSClass, Name, RData, RecordType};
use trust_dns_client::tcp::TcpClientStream;
use trust_dns_client::udp::UdpClientStream;
use trust_dns_proto::iocompat::AsyncIoTokioAsStd;
use trust_dns_proto::xfer::DnsResponse;

async fn start() -> (Supervisor, DynTxtStore) {
    let config = Config {
        dns_addrs: "127.0.0.1:0".parse().unwrap(),
        hook_addrs: "127.0.0.1:0".parse().unwrap(),
        ..Config::default()
    };
    let store: DynTxtStore = Arc::new(InMemoryTxtStore::new());
    let supervisor = Supervisor::start(&config, store.clone()).await.unwrap();
    (supervisor, store)
}

async fn udp_client(addr: SocketAddr) -> AsyncClient {
    let stream = UdpClientStream::<UdpSocket>::new(addr);
    let (client, bg) = AsyncClient::connect(stream).await.unwrap();
    tokio::spawn(bg);
    client
}

async fn tcp_client(addr: SocketAddr) -> AsyncClient {
    let (stream, sender) = TcpClientStream::<AsyncIoTokioAsStd<TcpStream>>::new(addr);
    let (client, bg) = AsyncClient::new(stream, sender, None).await.unwrap();
    tokio::spawn(bg);
    client
}

async fn lookup(client: &mut AsyncClient, name: &str, rtype: RecordType) -> DnsResponse {
    let response = client
        .query(Name::from_ascii(name).unwrap(), DNSClass::IN, rtype)
        .await
        .unwrap();
    assert_eq!(response.response_code(), ResponseCode::NoError);
    assert!(response.header().authoritative());
    assert!(!response.header().recursion_available());
    response
}

fn txt_values(response: &DnsResponse) -> Vec<String> {
    response
        .answers()
        .iter()
        .map(|record| match record.data() {
            Some(RData::TXT(txt)) => txt
                .txt_data()
                .iter()
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .collect(),
            other => panic!("expected TXT rdata, got {other:?}"),
        })
        .collect()
}

async fn hook(addr: SocketAddr, body: &'static str) -> StatusCode {
    let request = Request::post(format!("http://{addr}/hook"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    Client::new().request(request).await.unwrap().status()
}

#[tokio::test]
async fn add_query_remove_over_udp_and_tcp() {
    let (supervisor, _) = start().await;
    let dns_addr = supervisor.dns_addrs()[0];
    let hook_addr = supervisor.hook_addrs()[0];

    let status = hook(
        hook_addr,
        "ACME_HOOK=add&ACME_DOMAIN=example.com&ACME_KEYAUTH=abc123",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for mut client in [udp_client(dns_addr).await, tcp_client(dns_addr).await] {
        let response = lookup(&mut client, "_acme-challenge.example.com.", RecordType::TXT).await;
        assert_eq!(txt_values(&response), vec!["abc123"]);

        // The answer echoes the name as asked.
        let response = lookup(&mut client, "_ACME-Challenge.Example.COM.", RecordType::TXT).await;
        assert_eq!(response.answers().len(), 1);
        let record = &response.answers()[0];
        assert_eq!(record.name().to_ascii(), "_ACME-Challenge.Example.COM.");
        assert_eq!(record.dns_class(), DNSClass::IN);
        assert!(record.ttl() > 0);
        assert_eq!(txt_values(&response), vec!["abc123"]);
    }

    let status = hook(hook_addr, "ACME_HOOK=remove&ACME_DOMAIN=example.com").await;
    assert_eq!(status, StatusCode::OK);

    let mut client = udp_client(dns_addr).await;
    let response = lookup(&mut client, "_acme-challenge.example.com.", RecordType::TXT).await;
    assert!(response.answers().is_empty());

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn unprovisioned_and_unsupported_queries_are_empty_successes() {
    let (supervisor, store) = start().await;
    store.set_txt("_acme-challenge.example.com", "abc123".to_string());
    let mut client = udp_client(supervisor.dns_addrs()[0]).await;

    let response = lookup(&mut client, "_acme-challenge.other.com.", RecordType::TXT).await;
    assert!(response.answers().is_empty());

    for rtype in [RecordType::A, RecordType::AAAA, RecordType::NS, RecordType::SOA] {
        let response = lookup(&mut client, "_acme-challenge.example.com.", rtype).await;
        assert!(response.answers().is_empty(), "{rtype}");
    }

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn rejected_hooks_leave_records_alone() {
    let (supervisor, store) = start().await;
    let hook_addr = supervisor.hook_addrs()[0];

    let status = hook(hook_addr, "ACME_HOOK=add&ACME_DOMAIN=example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let status = hook(hook_addr, "ACME_HOOK=bogus&ACME_DOMAIN=example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.is_empty());

    let mut client = udp_client(supervisor.dns_addrs()[0]).await;
    let response = lookup(&mut client, "_acme-challenge.example.com.", RecordType::TXT).await;
    assert!(response.answers().is_empty());

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn long_values_served_over_tcp() {
    let (supervisor, store) = start().await;
    let value = "k".repeat(1000);
    store.set_txt("_acme-challenge.example.com", value.clone());

    let mut client = tcp_client(supervisor.dns_addrs()[0]).await;
    let response = lookup(&mut client, "_acme-challenge.example.com.", RecordType::TXT).await;
    assert_eq!(txt_values(&response), vec![value]);

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn oversized_udp_answers_are_truncated() {
    let (supervisor, store) = start().await;
    store.set_txt("_acme-challenge.example.com", "k".repeat(1000));

    // No EDNS, so the client accepts at most 512 bytes.
    let mut message = Message::new();
    message.set_id(4321).add_query(Query::query(
        Name::from_ascii("_acme-challenge.example.com.").unwrap(),
        RecordType::TXT,
    ));
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket
        .send_to(&message.to_vec().unwrap(), supervisor.dns_addrs()[0])
        .await
        .unwrap();

    let mut buf = vec![0; 4096];
    let (len, _) = tokio::time::timeout(Duration::from_secs(5), socket.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert!(len <= 512, "{len}");
    let response = Message::from_vec(&buf[..len]).unwrap();
    assert_eq!(response.id(), 4321);
    assert!(response.header().truncated());
    assert!(response.header().authoritative());
    assert_eq!(response.response_code(), ResponseCode::NoError);
    assert!(response.answers().is_empty());

    supervisor.stop().await.unwrap();
}
