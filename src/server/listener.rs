use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::{Config, Protocol};
use crate::dictionary::{DictionaryStore, Session};
use crate::http::connection::Connection;
use crate::resource::Resolver;
use crate::server::transport::TcpTransport;

/// Pause after a failed accept, so fd exhaustion does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// What each accepted connection is handed to.
enum Handler {
    Http(Arc<Resolver>),
    Dictionary(DictionaryStore),
}

/// A bound listening socket plus everything connections share.
pub struct Server {
    listener: TcpListener,
    handler: Handler,
    read_timeout: Duration,
    shutdown: Arc<watch::Sender<bool>>,
}

/// Asks a running [`Server`] to stop accepting connections.
#[derive(Clone)]
pub struct ShutdownHandle {
    shutdown: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Stops the accept loop. Connections already accepted run to completion.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

impl Server {
    /// Binds `host:port` with the configured backlog.
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let listen_addr = cfg.listen_addr();
        let addr = tokio::net::lookup_host(&listen_addr)
            .await
            .with_context(|| format!("failed to resolve {}", listen_addr))?
            .next()
            .with_context(|| format!("{} did not resolve to any address", listen_addr))?;

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.set_reuseaddr(true)?;
        socket
            .bind(addr)
            .with_context(|| format!("failed to bind {}", addr))?;
        let listener = socket.listen(cfg.server.backlog)?;

        let handler = match cfg.server.protocol {
            Protocol::Http => {
                let web_root = &cfg.static_files.web_root;
                if !web_root.is_dir() {
                    warn!(web_root = %web_root.display(), "Web root is not a directory");
                }
                Handler::Http(Arc::new(Resolver::local(web_root.clone())))
            }
            Protocol::Dictionary => Handler::Dictionary(DictionaryStore::new()),
        };

        info!(
            addr = %listener.local_addr()?,
            protocol = ?cfg.server.protocol,
            backlog = cfg.server.backlog,
            "Listening"
        );

        Ok(Self {
            listener,
            handler,
            read_timeout: cfg.read_timeout(),
            shutdown: Arc::new(watch::channel(false).0),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Accepts connections until shutdown is requested, then waits for the
    /// connections still in flight.
    pub async fn run(self) -> anyhow::Result<()> {
        let Server {
            listener,
            handler,
            read_timeout,
            shutdown,
        } = self;

        let mut stop = shutdown.subscribe();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "Failed to accept connection");
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                            continue;
                        }
                    };

                    debug!(peer = %peer, "Accepted connection");
                    let transport = TcpTransport::new(socket, peer);

                    match &handler {
                        Handler::Http(resolver) => {
                            let resolver = Arc::clone(resolver);
                            connections.spawn(async move {
                                let mut conn = Connection::new(transport, resolver, read_timeout);
                                let reason = conn.run().await;
                                debug!(peer = %peer, reason = ?reason, "Connection closed");
                            });
                        }
                        Handler::Dictionary(store) => {
                            let store = store.clone();
                            connections.spawn(async move {
                                let mut session = Session::new(transport, store);
                                let reason = session.run().await;
                                debug!(peer = %peer, reason = ?reason, "Connection closed");
                            });
                        }
                    }
                }

                _ = stop_requested(&mut stop) => {
                    break;
                }

                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Connection task failed");
                    }
                }
            }
        }

        drop(listener);
        info!(in_flight = connections.len(), "Stopped accepting connections");

        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Connection task failed");
            }
        }

        info!("All connections finished. Bye!");
        Ok(())
    }
}

/// Resolves once shutdown was requested, including before the loop started.
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    while !*stop.borrow_and_update() {
        if stop.changed().await.is_err() {
            return;
        }
    }
}
