//! Byte-stream transports a connection handler can run on.

use std::fmt;
use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::net::TcpStream;
use tracing::debug;

/// Remote endpoint identity, used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Peer {
    pub address: IpAddr,
    pub port: u16,
}

impl Peer {
    pub fn new(address: IpAddr, port: u16) -> Self {
        Self { address, port }
    }
}

impl From<SocketAddr> for Peer {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&SocketAddr::new(self.address, self.port), f)
    }
}

/// A connected, bidirectional byte stream with a known peer.
///
/// Reading and writing come from tokio's `AsyncRead`/`AsyncWrite`; `close`
/// shuts down the write half, after which the transport is dropped.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {
    fn peer(&self) -> Peer;

    fn close(&mut self) -> impl Future<Output = io::Result<()>> + Send {
        self.shutdown()
    }
}

/// An accepted TCP socket.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    peer: Peer,
}

impl TcpTransport {
    pub fn new(stream: TcpStream, addr: SocketAddr) -> Self {
        let peer = Peer::from(addr);

        // Nagle only delays the single response we write
        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        Self { stream, peer }
    }
}

impl Transport for TcpTransport {
    fn peer(&self) -> Peer {
        self.peer
    }
}

impl AsyncRead for TcpTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for TcpTransport {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

/// In-process transport backed by a tokio duplex pipe.
///
/// [`MemoryTransport::pair`] returns the server side and the client's end of
/// the pipe; shutting down the client end looks like a TCP half-close.
#[derive(Debug)]
pub struct MemoryTransport {
    inner: DuplexStream,
    peer: Peer,
}

impl MemoryTransport {
    pub fn pair(buffer_size: usize) -> (Self, DuplexStream) {
        Self::pair_with_peer(buffer_size, Peer::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
    }

    pub fn pair_with_peer(buffer_size: usize, peer: Peer) -> (Self, DuplexStream) {
        let (server, client) = tokio::io::duplex(buffer_size);
        (Self { inner: server, peer }, client)
    }
}

impl Transport for MemoryTransport {
    fn peer(&self) -> Peer {
        self.peer
    }
}

impl AsyncRead for MemoryTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for MemoryTransport {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
