//! HTTP request head decoder.
//!
//! Parses the request line and header fields with `httparse` and builds a
//! [`RequestHead`]. The request target is kept verbatim, and repeated header
//! fields are folded through [`RawHeaders::append_incoming`].
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header size: 8KB
//! - Only HTTP/1.0 and HTTP/1.1

use std::mem::MaybeUninit;

use bytes::{Buf, BytesMut};
use http::Version;
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;

use crate::protocol::{ParseError, PayloadSize, RawHeaderValue, RawHeaders, RequestHead};

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for HTTP request heads implementing the [`Decoder`] trait.
///
/// Yields the parsed [`RequestHead`] and the [`PayloadSize`] announced by its
/// `Content-Length` / `Transfer-Encoding` headers.
#[derive(Debug)]
pub struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    type Item = (RequestHead, PayloadSize);
    type Error = ParseError;

    /// # Errors
    ///
    /// Returns `ParseError` if:
    /// - The number of headers exceeds `MAX_HEADER_NUM`
    /// - The total header size exceeds `MAX_HEADER_BYTES`
    /// - The HTTP version is not supported
    /// - The framing headers are contradictory or malformed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // "GET / HTTP/1.1\r\n\r\n" is the shortest complete head
        if src.len() < 14 {
            return Ok(None);
        }

        let mut req = httparse::Request::new(&mut []);
        let mut headers: [MaybeUninit<httparse::Header>; MAX_HEADER_NUM] = [const { MaybeUninit::uninit() }; MAX_HEADER_NUM];

        let parsed_result = req.parse_with_uninit_headers(src, &mut headers).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        });

        match parsed_result? {
            Status::Complete(body_offset) => {
                trace!(head_size = body_offset, "parsed request head");
                ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

                let version = match req.version {
                    Some(0) => Version::HTTP_10,
                    Some(1) => Version::HTTP_11,
                    // Currently HTTP/2 and HTTP/3 not supported
                    _ => return Err(ParseError::InvalidVersion(req.version)),
                };

                let method = req.method.ok_or(ParseError::InvalidMethod)?;
                let url = req.path.ok_or(ParseError::InvalidUri)?;

                let mut head = RequestHead::new(method, url).with_version(version);
                let raw_headers = head.headers_mut();
                for header in req.headers.iter() {
                    raw_headers.append_incoming(header.name, latin1(header.value));
                }

                let payload_size = parse_payload(head.headers())?;

                src.advance(body_offset);
                Ok(Some((head, payload_size)))
            }
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                Ok(None)
            }
        }
    }
}

/// Header bytes are decoded as latin-1, every byte maps to one char.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Determines the payload framing from the request headers, for every method.
///
/// A `GET` that carries a body is still framed here, so the body is consumed
/// off the wire even when nobody reads it.
///
/// refer: <https://www.rfc-editor.org/rfc/rfc9112.html#name-message-body-length>
fn parse_payload(headers: &RawHeaders) -> Result<PayloadSize, ParseError> {
    let te_header = headers.get("transfer-encoding");
    let cl_header = headers.get("content-length");

    match (te_header, cl_header) {
        (None, None) => Ok(PayloadSize::new_empty()),

        (Some(te_value), None) => {
            if is_chunked(te_value) {
                Ok(PayloadSize::new_chunked())
            } else {
                Err(ParseError::invalid_header("transfer-encoding without chunked as the final coding"))
            }
        }

        (None, Some(cl_value)) => {
            let cl_str = cl_value.joined();
            let mut length = None;
            // repeated fields arrive joined with ", " and must all agree
            for item in cl_str.split(',') {
                let value = item
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ParseError::invalid_content_length(format!("value {cl_str} is not u64")))?;
                ensure!(
                    length.is_none_or(|first| first == value),
                    ParseError::invalid_content_length(format!("conflicting values {cl_str}"))
                );
                length = Some(value);
            }

            Ok(PayloadSize::new_length(length.unwrap_or_default()))
        }

        (Some(_), Some(_)) => Err(ParseError::invalid_content_length("transfer_encoding and content_length both present in headers")),
    }
}

/// Checks if the Transfer-Encoding header ends with the chunked coding.
fn is_chunked(header_value: &RawHeaderValue) -> bool {
    header_value.joined().rsplit(',').next().is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}
