//! Decoder for the chunked transfer coding,
//! see [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//!
//! Chunk extensions and trailer fields are accepted and discarded.

use crate::protocol::{ParseError, PayloadItem};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

/// Longest chunk-size or trailer line accepted, extensions included
const MAX_LINE_BYTES: usize = 4 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read `chunk-size [; ext] CRLF`
    Size,
    /// Read chunk data, the field holds the bytes still expected
    Body(u64),
    /// Read the CRLF closing a chunk
    BodyCrlf,
    /// Read trailer fields until the empty line
    Trailer,
    /// Final state after the last chunk
    End,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: ChunkedState::Size }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                ChunkedState::Size => {
                    let Some(line) = take_line(src)? else {
                        return Ok(None);
                    };
                    let size = parse_chunk_size(&line)?;
                    trace!(size, "read chunk size");
                    self.state = if size == 0 { ChunkedState::Trailer } else { ChunkedState::Body(size) };
                }

                ChunkedState::Body(remaining) => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    let len = usize::try_from(remaining).map_or(src.len(), |remaining| remaining.min(src.len()));
                    let bytes = src.split_to(len).freeze();
                    let remaining = remaining - bytes.len() as u64;
                    self.state = if remaining == 0 { ChunkedState::BodyCrlf } else { ChunkedState::Body(remaining) };
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                ChunkedState::BodyCrlf => {
                    if src.len() < 2 {
                        return Ok(None);
                    }
                    if &src[..2] != b"\r\n" {
                        return Err(ParseError::invalid_chunk("missing CRLF after chunk data"));
                    }
                    src.advance(2);
                    self.state = ChunkedState::Size;
                }

                ChunkedState::Trailer => {
                    let Some(line) = take_line(src)? else {
                        return Ok(None);
                    };
                    if line.is_empty() {
                        self.state = ChunkedState::End;
                    }
                }

                ChunkedState::End => {
                    trace!("finished reading chunked data");
                    return Ok(Some(PayloadItem::Eof));
                }
            }
        }
    }
}

/// Splits off one CRLF terminated line without its terminator.
fn take_line(src: &mut BytesMut) -> Result<Option<BytesMut>, ParseError> {
    match src.windows(2).position(|window| window == b"\r\n") {
        Some(index) => {
            let line = src.split_to(index);
            src.advance(2);
            Ok(Some(line))
        }
        None if src.len() > MAX_LINE_BYTES => Err(ParseError::invalid_chunk("chunk line too long")),
        None => Ok(None),
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let size = line.split(|b| *b == b';').next().unwrap_or_default().trim_ascii();
    let size = std::str::from_utf8(size).map_err(|_| ParseError::invalid_chunk("chunk size is not ascii"))?;
    u64::from_str_radix(size, 16).map_err(|_| ParseError::invalid_chunk(format!("invalid chunk size `{size}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn decode_all(decoder: &mut ChunkedDecoder, src: &mut BytesMut) -> Vec<PayloadItem> {
        let mut items = vec![];
        while let Some(item) = decoder.decode(src).unwrap() {
            let eof = item.is_eof();
            items.push(item);
            if eof {
                break;
            }
        }
        items
    }

    #[test]
    fn decodes_chunks_and_trailers() {
        let mut src = BytesMut::from(&b"5\r\nhello\r\n6;name=value\r\n world\r\n0\r\nExpires: never\r\n\r\nGET"[..]);
        let mut decoder = ChunkedDecoder::new();

        let items = decode_all(&mut decoder, &mut src);

        assert_eq!(
            items,
            vec![
                PayloadItem::Chunk(Bytes::from_static(b"hello")),
                PayloadItem::Chunk(Bytes::from_static(b" world")),
                PayloadItem::Eof,
            ]
        );
        assert_eq!(&src[..], b"GET");
    }

    #[test]
    fn resumes_on_partial_input() {
        let mut decoder = ChunkedDecoder::new();
        let mut src = BytesMut::from(&b"A\r\n01234"[..]);

        assert_eq!(decoder.decode(&mut src).unwrap(), Some(PayloadItem::Chunk(Bytes::from_static(b"01234"))));
        assert_eq!(decoder.decode(&mut src).unwrap(), None);

        src.extend_from_slice(b"56789\r");
        assert_eq!(decoder.decode(&mut src).unwrap(), Some(PayloadItem::Chunk(Bytes::from_static(b"56789"))));
        assert_eq!(decoder.decode(&mut src).unwrap(), None);

        src.extend_from_slice(b"\n0\r\n\r\n");
        assert_eq!(decoder.decode(&mut src).unwrap(), Some(PayloadItem::Eof));
    }

    #[test]
    fn rejects_bad_size() {
        let mut src = BytesMut::from(&b"zz\r\n"[..]);
        assert!(matches!(ChunkedDecoder::new().decode(&mut src), Err(ParseError::InvalidChunk { .. })));
    }

    #[test]
    fn rejects_missing_crlf() {
        let mut src = BytesMut::from(&b"1\r\naXX"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut src).unwrap().unwrap().is_chunk());
        assert!(decoder.decode(&mut src).is_err());
    }
}
