//! HTTP/1.1 wire codecs for the raw server.
//!
//! Requests are decoded as a stream of [`Message`](crate::protocol::Message)
//! items: first the head, then payload chunks up to an EOF item. Responses are
//! encoded in one piece once the listener has ended them.
//!
//! - Request side:
//!   - [`RequestDecoder`]: state machine over the head and payload decoders
//!   - [`header::HeaderDecoder`]: request line and header fields
//!   - [`body::PayloadDecoder`]: `Content-Length` and chunked payloads
//!
//! - Response side:
//!   - [`ResponseEncoder`]: writes an [`OutgoingResponse`]
//!   - [`header::HeaderEncoder`]: status line and header fields
//!
//! # Example
//!
//! ```no_run
//! use raw_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut request_buffer = BytesMut::new();
//! let request = decoder.decode(&mut request_buffer);
//! ```

pub mod body;
pub mod header;
mod request_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use response_encoder::OutgoingResponse;
pub use response_encoder::ResponseEncoder;
