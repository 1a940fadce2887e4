//! Socket accept loop and connection transports.

pub mod listener;
pub mod transport;

pub use listener::{Server, ShutdownHandle};
pub use transport::{MemoryTransport, Peer, TcpTransport, Transport};

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer half-closed (HTTP: before sending a request)
    PeerEnded,
    /// A response was written and the socket was shut down by us
    Forced,
    /// Nothing arrived within the read timeout
    TimedOut,
    /// Reading, writing or processing failed
    Failed,
}
