//! Request payload decoding.
//!
//! - [`LengthDecoder`]: `Content-Length` framed payloads
//! - [`ChunkedDecoder`]: chunked transfer coding
//! - [`PayloadDecoder`]: picks one of the above, or none, from a [`PayloadSize`](crate::protocol::PayloadSize)
//!
//! Responses are always written with a known length, so there is no payload encoder.

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;

pub use chunked_decoder::ChunkedDecoder;
pub use length_decoder::LengthDecoder;
pub use payload_decoder::PayloadDecoder;
