//! A raw, Node-style HTTP/1.1 server built on tokio.
//!
//! The server does not speak in `http::Request`/`http::Response`. Each request
//! reaches a [`RequestListener`](handler::RequestListener) as an
//! [`IncomingMessage`](protocol::IncomingMessage): the method and request target
//! exactly as received, and lowercase header names mapped to either a single
//! string or a list of strings. The listener answers through a
//! [`ServerResponse`](protocol::ServerResponse) that it fills in and then ends
//! or destroys.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//! use raw_http::connection::HttpConnection;
//! use raw_http::handler::listener_fn;
//! use raw_http::protocol::{IncomingMessage, ServerResponse};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let listener = Arc::new(listener_fn(hello_world));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let listener = listener.clone();
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer);
//!             match connection.process(listener).await {
//!                 Ok(()) => info!("finished process, connection shutdown"),
//!                 Err(e) => error!(cause = %e, "service has error, connection shutdown"),
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: IncomingMessage, mut response: ServerResponse) {
//!     info!(url = request.url(), "receive request");
//!     let _ = response.set_header("content-type", "text/plain");
//!     response.end(Some(Bytes::from_static(b"Hello World!\r\n")));
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: per-connection request loop, keep-alive and `100 Continue`
//! - [`protocol`]: incoming messages, server responses, raw headers, errors
//! - [`codec`]: HTTP/1.1 decoding of requests and encoding of responses
//! - [`handler`]: the request listener trait
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only
//! - Responses are buffered until ended and always sent with `Content-Length`
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
