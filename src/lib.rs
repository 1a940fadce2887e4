//! massive-magenta - a minimal HTTP/1.0 static file server
//!
//! Requests are parsed straight off the socket, resolved against a web root
//! and answered with hand-framed responses. The same listener can instead
//! serve a small word dictionary protocol.

pub mod config;
pub mod dictionary;
pub mod http;
pub mod resource;
pub mod server;
