use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::http::parser::parse_request;
use crate::http::request::Method;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::resource::{FileSystem, LocalFileSystem, Resolver};
pub use crate::server::CloseReason;
use crate::server::transport::{Peer, Transport};

/// Largest request chunk read in one go. Requests have no body, so the entry
/// line and headers are expected to fit.
const READ_CHUNK_SIZE: usize = 8192;

/// One accepted connection serving a single HTTP/1.0 exchange.
pub struct Connection<S, F = LocalFileSystem> {
    stream: S,
    peer: Peer,
    resolver: Arc<Resolver<F>>,
    read_timeout: Duration,
    buffer: BytesMut,
    state: ConnectionState,
}

#[derive(Debug)]
pub enum ConnectionState {
    Connected,
    AwaitingRequest,
    Processing(Bytes),
    Responded(StatusCode),
    Closed(CloseReason),
}

enum ReadOutcome {
    Data(Bytes),
    Eof,
    TimedOut,
}

impl<S, F> Connection<S, F>
where
    S: Transport,
    F: FileSystem,
{
    pub fn new(stream: S, resolver: Arc<Resolver<F>>, read_timeout: Duration) -> Self {
        let peer = stream.peer();

        Self {
            stream,
            peer,
            resolver,
            read_timeout,
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            state: ConnectionState::Connected,
        }
    }

    pub fn peer(&self) -> Peer {
        self.peer
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Drives the connection until it is closed.
    ///
    /// Never fails: every error is logged and ends this connection only.
    pub async fn run(&mut self) -> CloseReason {
        loop {
            let state = std::mem::replace(
                &mut self.state,
                ConnectionState::Closed(CloseReason::Failed),
            );

            self.state = match state {
                ConnectionState::Connected => {
                    info!(peer = %self.peer, "Client connected");
                    ConnectionState::AwaitingRequest
                }

                ConnectionState::AwaitingRequest => match self.read_request().await {
                    Ok(ReadOutcome::Data(chunk)) => ConnectionState::Processing(chunk),
                    Ok(ReadOutcome::Eof) => {
                        // Graceful end: nothing to answer, just drop the socket
                        info!(peer = %self.peer, "Client disconnected");
                        ConnectionState::Closed(CloseReason::PeerEnded)
                    }
                    Ok(ReadOutcome::TimedOut) => {
                        warn!(
                            peer = %self.peer,
                            timeout_secs = self.read_timeout.as_secs(),
                            "No request received before timeout"
                        );
                        self.force_close().await;
                        ConnectionState::Closed(CloseReason::TimedOut)
                    }
                    Err(e) => {
                        error!(peer = %self.peer, error = %e, "Failed to read request");
                        self.force_close().await;
                        ConnectionState::Closed(CloseReason::Failed)
                    }
                },

                ConnectionState::Processing(chunk) => self.process(&chunk).await,

                ConnectionState::Responded(status) => {
                    // HTTP/1.0: one exchange per connection
                    debug!(peer = %self.peer, status = status.as_u16(), "Closing after response");
                    self.force_close().await;
                    ConnectionState::Closed(CloseReason::Forced)
                }

                ConnectionState::Closed(reason) => {
                    self.state = ConnectionState::Closed(reason);
                    return reason;
                }
            };
        }
    }

    async fn read_request(&mut self) -> std::io::Result<ReadOutcome> {
        self.buffer.clear();
        self.buffer.reserve(READ_CHUNK_SIZE);

        let read = timeout(self.read_timeout, self.stream.read_buf(&mut self.buffer)).await;

        match read {
            Err(_elapsed) => Ok(ReadOutcome::TimedOut),
            Ok(Ok(0)) => Ok(ReadOutcome::Eof),
            Ok(Ok(_)) => Ok(ReadOutcome::Data(self.buffer.split().freeze())),
            Ok(Err(e)) => Err(e),
        }
    }

    /// Produces and writes the response for one request chunk.
    async fn process(&mut self, chunk: &[u8]) -> ConnectionState {
        let response = match self.handle_request(chunk).await {
            Ok(response) => response,
            Err(e) => {
                error!(peer = %self.peer, error = %e, "Failed to process request");
                self.force_close().await;
                return ConnectionState::Closed(CloseReason::Failed);
            }
        };

        let status = response.status;
        let mut writer = ResponseWriter::new(&response);

        match writer.write_to(&mut self.stream).await {
            Ok(()) => ConnectionState::Responded(status),
            Err(e) => {
                error!(
                    peer = %self.peer,
                    status = status.as_u16(),
                    error = %e,
                    "Failed to write response"
                );
                self.force_close().await;
                ConnectionState::Closed(CloseReason::Failed)
            }
        }
    }

    /// Maps one request chunk to its response.
    ///
    /// Fails only if the resolver task itself dies.
    async fn handle_request(&self, chunk: &[u8]) -> anyhow::Result<Response> {
        let request = match parse_request(chunk) {
            Ok(request) => request,
            Err(e) => {
                info!(peer = %self.peer, error = %e, status = 400, "Rejected request");
                return Ok(Response::bad_request());
            }
        };

        if request.method != Method::GET {
            info!(
                peer = %self.peer,
                method = %request.method,
                target = %request.target,
                status = 400,
                "Unsupported method"
            );
            return Ok(Response::bad_request());
        }

        let resolver = Arc::clone(&self.resolver);
        let target = request.target.clone();
        let resolved = tokio::spawn(async move { resolver.resolve(&target).await }).await?;

        let response = match resolved {
            Ok(resource) => Response::ok(resource),
            Err(e) => {
                debug!(peer = %self.peer, reason = %e, "Target not resolved");
                Response::not_found()
            }
        };

        info!(
            peer = %self.peer,
            request = %request.entry_line(),
            status = response.status.as_u16(),
            "Request served"
        );

        Ok(response)
    }

    async fn force_close(&mut self) {
        if let Err(e) = self.stream.close().await {
            debug!(peer = %self.peer, error = %e, "Error while closing connection");
        }
    }
}
