use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, info};

use crate::dictionary::command::{Command, CommandError, Reply};
use crate::dictionary::store::DictionaryStore;
use crate::server::CloseReason;
use crate::server::transport::{Peer, Transport};

pub const GREETING: &str = "Successful connection.\r\nAvailable commands: GET, SET, CLEAR, ALL.\r\n";
pub const FAREWELL: &str = "Finished. Bye!\r\n";

/// One client of the dictionary protocol.
///
/// Unlike HTTP the connection stays open: every chunk is a command, and the
/// session ends when the peer half-closes. Idle clients are never dropped.
pub struct Session<S> {
    stream: S,
    peer: Peer,
    store: DictionaryStore,
    buffer: BytesMut,
}

impl<S: Transport> Session<S> {
    pub fn new(stream: S, store: DictionaryStore) -> Self {
        let peer = stream.peer();

        Self {
            stream,
            peer,
            store,
            buffer: BytesMut::with_capacity(1024),
        }
    }

    pub async fn run(&mut self) -> CloseReason {
        info!(peer = %self.peer, "Client connected");

        match self.serve().await {
            Ok(reason) => reason,
            Err(e) => {
                error!(peer = %self.peer, error = %e, "Dictionary session failed");
                if let Err(e) = self.stream.close().await {
                    debug!(peer = %self.peer, error = %e, "Error while closing connection");
                }
                CloseReason::Failed
            }
        }
    }

    async fn serve(&mut self) -> anyhow::Result<CloseReason> {
        self.stream.write_all(GREETING.as_bytes()).await?;

        loop {
            self.buffer.clear();

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                self.stream.write_all(FAREWELL.as_bytes()).await?;
                self.stream.close().await?;
                info!(peer = %self.peer, "Client disconnected");
                return Ok(CloseReason::PeerEnded);
            }

            debug!(peer = %self.peer, bytes = n, "Client sent data");

            let input = String::from_utf8_lossy(&self.buffer).into_owned();
            let wire = self.answer(&input).await;

            self.stream.write_all(wire.as_bytes()).await?;
        }
    }

    async fn answer(&self, input: &str) -> String {
        match Command::parse(input) {
            Ok(command) => command.execute(&self.store).await.to_wire(true),
            // An empty chunk is not a command, so no separator follows
            Err(CommandError::Missing) => Reply::Error(CommandError::Missing.to_string()).to_wire(false),
            Err(e) => Reply::Error(e.to_string()).to_wire(true),
        }
    }
}
