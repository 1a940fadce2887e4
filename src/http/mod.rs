//! HTTP/1.0 protocol implementation.
//!
//! One request per connection: the server reads a single chunk, answers it,
//! and closes the socket. Only GET is served.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection state machine
//! - **`parser`**: Turns a raw request chunk into a [`request::Request`]
//! - **`headers`**: Ordered header mapping with number/text values
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Frames responses into wire bytes and writes them out
//! - **`mime`**: Content type lookup by file extension
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────────┐
//!        │    Connected    │
//!        └────────┬────────┘
//!                 ▼
//!        ┌─────────────────┐  peer half-close
//!        │ AwaitingRequest │ ─────────────────────┐
//!        └────────┬────────┘                      │
//!                 │ data chunk                    │
//!                 ▼                               │
//!        ┌─────────────────┐                      │
//!        │   Processing    │ ← parse, resolve,    │
//!        └────────┬────────┘   frame, write       │
//!                 │ response written              │
//!                 ▼                               │
//!        ┌─────────────────┐                      │
//!        │    Responded    │                      │
//!        └────────┬────────┘                      │
//!                 │ force-close                   │
//!                 ▼                               │
//!        ┌─────────────────┐                      │
//!        │     Closed      │ ◄────────────────────┘
//!        └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use massive_magenta::http::connection::Connection;
//! use massive_magenta::resource::Resolver;
//! use massive_magenta::server::TcpTransport;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8124").await?;
//!     let resolver = Arc::new(Resolver::local("public"));
//!
//!     loop {
//!         let (socket, addr) = listener.accept().await?;
//!         let resolver = Arc::clone(&resolver);
//!         tokio::spawn(async move {
//!             let transport = TcpTransport::new(socket, addr);
//!             Connection::new(transport, resolver, Duration::from_secs(30)).run().await;
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
