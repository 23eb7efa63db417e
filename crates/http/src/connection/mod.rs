//! Connection handling of the raw server.
//!
//! [`HttpConnection`] drives one client connection: it decodes requests, hands
//! each one to a [`RequestListener`](crate::handler::RequestListener) together
//! with a [`ServerResponse`](crate::protocol::ServerResponse), and writes the
//! finished response back. Connections are kept alive as HTTP/1.x allows.

mod http_connection;

pub use http_connection::HttpConnection;
