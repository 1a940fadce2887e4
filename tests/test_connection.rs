//! Connection state machine tests over an in-memory transport.

use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use massive_magenta::http::connection::{CloseReason, Connection, ConnectionState};
use massive_magenta::resource::{MemoryFileSystem, Resolver};
use massive_magenta::server::{MemoryTransport, Peer, Transport};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::task::JoinHandle;

const INDEX: &str = "<!DOCTYPE html><h1>home</h1>";

fn resolver() -> Arc<Resolver<MemoryFileSystem>> {
    let fs = MemoryFileSystem::new()
        .with_file("/www/index.html", INDEX)
        .with_file("/www/test.txt", "plain text")
        .with_file("/www/test/notes.md", "# notes")
        .with_file("/www/café.txt", "accent")
        .with_file("/www/hello world.txt", "space");

    Arc::new(Resolver::new("/www", fs))
}

fn spawn_connection(read_timeout: Duration) -> (JoinHandle<CloseReason>, DuplexStream) {
    let (transport, client) = MemoryTransport::pair(64 * 1024);
    let resolver = resolver();

    let handle = tokio::spawn(async move {
        let mut conn = Connection::new(transport, resolver, read_timeout);
        let reason = conn.run().await;
        assert!(matches!(conn.state(), ConnectionState::Closed(r) if *r == reason));
        reason
    });

    (handle, client)
}

/// Sends one request and returns everything the server wrote before closing.
async fn exchange(request: &[u8]) -> (String, CloseReason) {
    let (handle, mut client) = spawn_connection(Duration::from_secs(5));

    client.write_all(request).await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();

    let reason = handle.await.unwrap();
    (String::from_utf8(response).unwrap(), reason)
}

#[tokio::test]
async fn test_get_index() {
    let (response, reason) = exchange(b"GET / HTTP/1.0\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(response.contains("Server: massive-magenta\r\n"));
    assert!(response.contains("Content-Type: text/html; charset=utf-8\r\n"));
    assert!(response.contains(&format!("Content-Length: {}\r\n", INDEX.len())));
    assert!(response.ends_with(&format!("\r\n\r\n{}\r\n", INDEX)));
    assert_eq!(reason, CloseReason::Forced);
}

#[tokio::test]
async fn test_get_without_headers_is_served() {
    let (response, _) = exchange(b"GET /test.txt HTTP/1.0").await;

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(response.contains("Content-Length: 10\r\n"));
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let (response, reason) = exchange(b"GET /missing.html HTTP/1.0\r\n\r\n").await;

    assert_eq!(response, "HTTP/1.0 404 Not Found\r\nServer: massive-magenta\r\n\r\n");
    assert_eq!(reason, CloseReason::Forced);
}

#[tokio::test]
async fn test_directory_without_index_is_404() {
    let (response, _) = exchange(b"GET /test/ HTTP/1.0\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.0 404 Not Found\r\n"));
}

#[tokio::test]
async fn test_garbled_request_is_400() {
    let (response, reason) = exchange(b".").await;

    assert_eq!(response, "HTTP/1.0 400 Bad Request\r\nServer: massive-magenta\r\n\r\n");
    assert_eq!(reason, CloseReason::Forced);
}

#[tokio::test]
async fn test_missing_version_is_400() {
    let (response, _) = exchange(b"GET /\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.0 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_post_is_400() {
    let (response, _) = exchange(b"POST /test.txt HTTP/1.0\r\nContent-Length: 0\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.0 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_half_close_before_request_sends_nothing() {
    let (handle, mut client) = spawn_connection(Duration::from_secs(5));

    client.shutdown().await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();

    assert!(response.is_empty());
    assert_eq!(handle.await.unwrap(), CloseReason::PeerEnded);
}

#[tokio::test]
async fn test_idle_connection_times_out() {
    let (handle, mut client) = spawn_connection(Duration::from_millis(50));

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();

    assert!(response.is_empty());
    assert_eq!(handle.await.unwrap(), CloseReason::TimedOut);
}

#[tokio::test]
async fn test_second_request_is_never_served() {
    let (handle, mut client) = spawn_connection(Duration::from_secs(5));

    client.write_all(b"GET /test.txt HTTP/1.0\r\n\r\n").await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    assert_eq!(handle.await.unwrap(), CloseReason::Forced);

    // The server side is gone; at most the write lands in a dead pipe
    let _ = client.write_all(b"GET / HTTP/1.0\r\n\r\n").await;
    let mut more = Vec::new();
    let _ = client.read_to_end(&mut more).await;
    assert!(more.is_empty());

    let text = String::from_utf8(response).unwrap();
    assert_eq!(text.matches("HTTP/1.0").count(), 1);
}

#[tokio::test]
async fn test_escaped_and_non_ascii_targets_are_served() {
    for (request, body) in [
        ("GET /café.txt HTTP/1.0\r\n\r\n", "accent"),
        ("GET /caf%C3%A9.txt HTTP/1.0\r\n\r\n", "accent"),
        ("GET /hello%20world.txt HTTP/1.0\r\n\r\n", "space"),
    ] {
        let (response, _) = exchange(request.as_bytes()).await;

        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{:?}", response);
        assert!(response.ends_with(&format!("\r\n\r\n{}\r\n", body)));
    }
}

#[tokio::test]
async fn test_encoded_traversal_is_404() {
    let (response, _) = exchange(b"GET /%2F..%2Findex.html HTTP/1.0\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.0 404 Not Found\r\n"));
}

/// How a [`BrokenWriter`] answers every write.
#[derive(Clone, Copy)]
enum WriteFailure {
    Error,
    Zero,
}

/// Delivers one request, then refuses every write.
struct BrokenWriter {
    request: &'static [u8],
    failure: WriteFailure,
    writes: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl BrokenWriter {
    fn new(request: &'static [u8], failure: WriteFailure) -> Self {
        Self {
            request,
            failure,
            writes: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl AsyncRead for BrokenWriter {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let n = self.request.len().min(buf.remaining());
        buf.put_slice(&self.request[..n]);
        self.request = &self.request[n..];
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for BrokenWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        match self.failure {
            WriteFailure::Error => Poll::Ready(Err(io::ErrorKind::BrokenPipe.into())),
            WriteFailure::Zero => Poll::Ready(Ok(0)),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

impl Transport for BrokenWriter {
    fn peer(&self) -> Peer {
        Peer::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4242)
    }
}

#[tokio::test]
async fn test_write_failure_closes_without_retry() {
    for failure in [WriteFailure::Error, WriteFailure::Zero] {
        let transport = BrokenWriter::new(b"GET /test.txt HTTP/1.0\r\n\r\n", failure);
        let writes = Arc::clone(&transport.writes);
        let closes = Arc::clone(&transport.closes);

        let mut conn = Connection::new(transport, resolver(), Duration::from_secs(5));
        let reason = conn.run().await;

        assert_eq!(reason, CloseReason::Failed);
        assert!(matches!(conn.state(), ConnectionState::Closed(CloseReason::Failed)));
        assert_eq!(writes.load(Ordering::SeqCst), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
