//! HTTP head processing: request heads are decoded, response heads encoded.
//!
//! - [`HeaderDecoder`]: request line and header fields into a `RequestHead`,
//!   plus the payload framing they announce
//! - [`HeaderEncoder`]: status line and header fields of a `ResponseHead`,
//!   with the framing headers the connection decided on

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeadFraming;
pub use header_encoder::HeaderEncoder;
