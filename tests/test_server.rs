//! End-to-end tests over real TCP sockets.

use std::net::SocketAddr;
use std::path::Path;

use massive_magenta::config::{Config, Protocol};
use massive_magenta::server::{Server, ShutdownHandle};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

fn test_config(protocol: Protocol) -> Config {
    let mut cfg = Config::default();
    cfg.server.host = "127.0.0.1".to_string();
    cfg.server.port = 0;
    cfg.server.read_timeout_secs = 5;
    cfg.server.protocol = protocol;
    cfg.static_files.web_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/www");
    cfg
}

async fn start(protocol: Protocol) -> (SocketAddr, ShutdownHandle, JoinHandle<anyhow::Result<()>>) {
    let server = Server::bind(&test_config(protocol)).await.unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    let handle = tokio::spawn(server.run());

    (addr, shutdown, handle)
}

async fn request(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

fn header<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    let prefix = format!("{}: ", name);
    response
        .split("\r\n")
        .take_while(|line| !line.is_empty())
        .find_map(|line| line.strip_prefix(prefix.as_str()))
}

#[tokio::test]
async fn test_serves_index_document() {
    let (addr, shutdown, handle) = start(Protocol::Http).await;

    let response = request(addr, b"GET / HTTP/1.0\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    assert_eq!(header(&response, "Server"), Some("massive-magenta"));
    assert_eq!(header(&response, "Content-Type"), Some("text/html; charset=utf-8"));
    assert_eq!(header(&response, "Content-Length"), Some("221"));

    shutdown.shutdown();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_serves_text_file() {
    let (addr, shutdown, handle) = start(Protocol::Http).await;

    let response = request(addr, b"GET /test.txt HTTP/1.0\r\nUser-Agent: test\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    assert_eq!(header(&response, "Content-Type"), Some("text/plain; charset=utf-8"));
    assert_eq!(header(&response, "Content-Length"), Some("126"));

    let body = response.split_once("\r\n\r\n").unwrap().1;
    assert_eq!(body.len(), 126 + 2);

    shutdown.shutdown();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_error_statuses() {
    let (addr, shutdown, handle) = start(Protocol::Http).await;

    let not_found = request(addr, b"GET /test/ HTTP/1.0\r\n\r\n").await;
    assert!(not_found.starts_with("HTTP/1.0 404 Not Found\r\n"));
    assert_eq!(header(&not_found, "Server"), Some("massive-magenta"));
    assert_eq!(header(&not_found, "Content-Length"), None);

    let garbled = request(addr, b".").await;
    assert!(garbled.starts_with("HTTP/1.0 400 Bad Request\r\n"));

    let post = request(addr, b"POST / HTTP/1.0\r\n\r\n").await;
    assert!(post.starts_with("HTTP/1.0 400 Bad Request\r\n"));

    shutdown.shutdown();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_connections_are_independent() {
    let (addr, shutdown, handle) = start(Protocol::Http).await;

    let requests = (0..8).map(|i| {
        tokio::spawn(async move {
            let raw: &[u8] = if i % 2 == 0 {
                b"GET /test.txt HTTP/1.0\r\n\r\n"
            } else {
                b"\x00garbage"
            };
            request(addr, raw).await
        })
    });

    for (i, task) in requests.collect::<Vec<_>>().into_iter().enumerate() {
        let response = task.await.unwrap();
        let expected = if i % 2 == 0 { "HTTP/1.0 200 OK" } else { "HTTP/1.0 400 Bad Request" };
        assert!(response.starts_with(expected), "request {}: {:?}", i, response);
    }

    shutdown.shutdown();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_waits_for_in_flight_connections() {
    let (addr, shutdown, handle) = start(Protocol::Http).await;

    // Accepted but idle: the request is sent only after shutdown was requested
    let mut stream = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    shutdown.shutdown();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!handle.is_finished());

    stream.write_all(b"GET /test.txt HTTP/1.0\r\n\r\n").await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    assert!(response.starts_with(b"HTTP/1.0 200 OK\r\n"));

    handle.await.unwrap().unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_dictionary_protocol_over_tcp() {
    let (addr, shutdown, handle) = start(Protocol::Dictionary).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"ALL").await.unwrap();
    stream.shutdown().await.unwrap();

    let mut transcript = Vec::new();
    stream.read_to_end(&mut transcript).await.unwrap();
    let transcript = String::from_utf8(transcript).unwrap();

    assert!(transcript.starts_with("Successful connection.\r\n"));
    assert!(transcript.contains("ERROR There are no words saved.\r\n"));
    assert!(transcript.ends_with("Finished. Bye!\r\n"));

    shutdown.shutdown();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_dictionary_ignores_read_timeout() {
    let mut cfg = test_config(Protocol::Dictionary);
    cfg.server.read_timeout_secs = 1;

    let server = Server::bind(&cfg).await.unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    let handle = tokio::spawn(server.run());

    let mut stream = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    stream.write_all(b"SET potato tuber").await.unwrap();
    stream.shutdown().await.unwrap();

    let mut transcript = Vec::new();
    stream.read_to_end(&mut transcript).await.unwrap();
    let transcript = String::from_utf8(transcript).unwrap();

    assert!(transcript.contains("ANSWER Word potato has been set.\r\n"));
    assert!(transcript.ends_with("Finished. Bye!\r\n"));

    shutdown.shutdown();
    handle.await.unwrap().unwrap();
}
