//! HTTP response head encoder.
//!
//! Serializes the status line and header fields of a [`ResponseHead`]. A header
//! stored as [`RawHeaderValue::Multiple`](crate::protocol::RawHeaderValue) is
//! written as one line per value, so repeated `Set-Cookie` entries stay distinct
//! on the wire. Values are written as latin-1, one byte per char.
//!
//! Framing headers are owned by the encoder: any `Content-Length` or
//! `Transfer-Encoding` set by the listener is replaced.

use crate::protocol::{ResponseHead, SendError};

use bytes::{BufMut, BytesMut};

use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Framing decided by the connection for one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadFraming {
    /// `None` for statuses that never carry a body (1xx, 204, 304)
    pub content_length: Option<u64>,
    /// whether the connection closes after this response
    pub close: bool,
    /// announce `connection: keep-alive`, needed by HTTP/1.0 peers
    pub keep_alive: bool,
}

/// Encoder for HTTP/1.1 response heads.
#[derive(Debug)]
pub struct HeaderEncoder;

impl Encoder<(ResponseHead, HeadFraming)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (ResponseHead, HeadFraming), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (head, framing) = item;

        dst.reserve(INIT_HEADER_SIZE);
        let status = head.status();
        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), status.canonical_reason().unwrap_or("Unknown"))?;

        for (name, value) in head.headers() {
            if is_framing_header(name) || ((framing.close || framing.keep_alive) && name == "connection") {
                continue;
            }
            for item in value {
                dst.put_slice(name.as_bytes());
                dst.put_slice(b": ");
                dst.extend(item.chars().map(|c| u8::try_from(c).unwrap_or(b'?')));
                dst.put_slice(b"\r\n");
            }
        }

        if let Some(length) = framing.content_length {
            write!(FastWrite(dst), "content-length: {length}\r\n")?;
        }

        if framing.close {
            dst.put_slice(b"connection: close\r\n");
        } else if framing.keep_alive {
            dst.put_slice(b"connection: keep-alive\r\n");
        }

        dst.put_slice(b"\r\n");
        Ok(())
    }
}

fn is_framing_header(name: &str) -> bool {
    name == "content-length" || name == "transfer-encoding"
}

/// Writer over `BytesMut` for the `write!` formatting above.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
