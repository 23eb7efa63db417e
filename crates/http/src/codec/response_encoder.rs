//! HTTP response encoder.
//!
//! A [`ServerResponse`](crate::protocol::ServerResponse) is buffered until the
//! listener ends it, so every response reaches the wire with a known length:
//! the head carries `Content-Length` and the payload follows in one write.

use crate::codec::header::{HeadFraming, HeaderEncoder};
use crate::protocol::{ResponseHead, SendError};
use bytes::{Bytes, BytesMut};
use http::StatusCode;
use tokio_util::codec::Encoder;

/// A finished response as handed to the [`ResponseEncoder`].
#[derive(Debug)]
pub struct OutgoingResponse {
    head: ResponseHead,
    payload: Bytes,
    skip_payload: bool,
    close: bool,
    keep_alive: bool,
}

impl OutgoingResponse {
    pub fn new(head: ResponseHead, payload: Bytes) -> Self {
        Self { head, payload, skip_payload: false, close: false, keep_alive: false }
    }

    /// Writes the head only, as required for `HEAD` requests.
    #[must_use]
    pub fn skip_payload(mut self, skip_payload: bool) -> Self {
        self.skip_payload = skip_payload;
        self
    }

    /// Announces `connection: close`.
    #[must_use]
    pub fn close(mut self, close: bool) -> Self {
        self.close = close;
        self
    }

    /// Announces `connection: keep-alive`, ignored when the response also closes.
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}

#[derive(Debug)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for ResponseEncoder {
    fn default() -> Self {
        Self { header_encoder: HeaderEncoder }
    }
}

impl Encoder<OutgoingResponse> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: OutgoingResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let OutgoingResponse { head, payload, skip_payload, close, keep_alive } = item;

        let bodyless = is_bodyless(head.status());
        let content_length = if bodyless { None } else { Some(payload.len() as u64) };

        self.header_encoder.encode((head, HeadFraming { content_length, close, keep_alive }), dst)?;

        if !(bodyless || skip_payload) {
            dst.extend_from_slice(&payload);
        }
        Ok(())
    }
}

/// Statuses that never carry a message body.
fn is_bodyless(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(response: OutgoingResponse) -> String {
        let mut dst = BytesMut::new();
        ResponseEncoder::new().encode(response, &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn writes_head_and_payload() {
        let encoded = encode(OutgoingResponse::new(ResponseHead::new(StatusCode::OK), Bytes::from_static(b"hello world")));

        assert_eq!(encoded, "HTTP/1.1 200 OK\r\ncontent-length: 11\r\n\r\nhello world");
    }

    #[test]
    fn head_request_keeps_length() {
        let response = OutgoingResponse::new(ResponseHead::new(StatusCode::OK), Bytes::from_static(b"hello")).skip_payload(true);

        assert_eq!(encode(response), "HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\n");
    }

    #[test]
    fn no_content_has_no_body() {
        let response = OutgoingResponse::new(ResponseHead::new(StatusCode::NO_CONTENT), Bytes::from_static(b"ignored")).close(true);

        assert_eq!(encode(response), "HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n");
    }
}
