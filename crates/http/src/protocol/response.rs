//! Outgoing response representation.
//!
//! A [`ServerResponse`] collects the status, headers and payload of a response.
//! Nothing reaches the wire until it is finished with [`ServerResponse::end`]:
//! the finished [`ResponseOutcome`] travels back to the connection through a
//! oneshot channel, see [`ServerResponse::channel`].
//!
//! `end` and `destroy` take the response by value, so a response is terminated
//! at most once. Dropping an unfinished response counts as destroying it.

use bytes::{Bytes, BytesMut};
use futures::channel::oneshot;
use http::{HeaderName, StatusCode};
use tracing::trace;

use crate::protocol::{RawHeaderValue, RawHeaders, SendError};

/// Status and headers of a finished response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: StatusCode,
    headers: RawHeaders,
}

impl ResponseHead {
    pub fn new(status: StatusCode) -> Self {
        Self { status, headers: RawHeaders::new() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &RawHeaders {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut RawHeaders {
        &mut self.headers
    }
}

/// How a [`ServerResponse`] was terminated.
#[derive(Debug)]
pub enum ResponseOutcome {
    /// The response was ended, `payload` holds every byte written.
    Finished { head: ResponseHead, payload: Bytes },
    /// The response was destroyed or dropped, the connection must close unanswered.
    Destroyed,
}

impl ResponseOutcome {
    pub fn is_destroyed(&self) -> bool {
        matches!(self, ResponseOutcome::Destroyed)
    }

    pub fn into_finished(self) -> Option<(ResponseHead, Bytes)> {
        match self {
            ResponseOutcome::Finished { head, payload } => Some((head, payload)),
            ResponseOutcome::Destroyed => None,
        }
    }
}

/// The receiving side of [`ServerResponse::channel`].
#[derive(Debug)]
pub struct PendingResponse {
    receiver: oneshot::Receiver<ResponseOutcome>,
}

impl PendingResponse {
    /// Waits until the response is ended, destroyed or dropped.
    pub async fn outcome(self) -> ResponseOutcome {
        self.receiver.await.unwrap_or(ResponseOutcome::Destroyed)
    }
}

/// The writable half of an exchange, handed to the listener with each request.
#[derive(Debug)]
pub struct ServerResponse {
    head: ResponseHead,
    buffer: BytesMut,
    headers_sent: bool,
    sender: oneshot::Sender<ResponseOutcome>,
}

impl ServerResponse {
    /// Creates a response with status `200 OK` together with the handle that
    /// observes how it is terminated.
    pub fn channel() -> (ServerResponse, PendingResponse) {
        let (sender, receiver) = oneshot::channel();
        let response = ServerResponse { head: ResponseHead::new(StatusCode::OK), buffer: BytesMut::new(), headers_sent: false, sender };
        (response, PendingResponse { receiver })
    }

    pub fn status_code(&self) -> StatusCode {
        self.head.status
    }

    pub fn set_status_code(&mut self, status: StatusCode) {
        self.head.status = status;
    }

    pub fn headers(&self) -> &RawHeaders {
        &self.head.headers
    }

    pub fn get_header(&self, name: &str) -> Option<&RawHeaderValue> {
        self.head.headers.get(name)
    }

    /// Whether a body chunk has been written, after which headers are frozen.
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Sets `name` to `value`, a [`RawHeaderValue::Multiple`] becomes one header line per item.
    ///
    /// # Errors
    ///
    /// Fails when the body has started or when the name or a value is not a legal header.
    pub fn set_header(&mut self, name: &str, value: impl Into<RawHeaderValue>) -> Result<(), SendError> {
        if self.headers_sent {
            return Err(SendError::headers_sent(name));
        }

        HeaderName::from_bytes(name.as_bytes()).map_err(|e| SendError::invalid_header(name, e))?;
        let value = value.into();
        if let Some(item) = value.iter().find(|item| !is_valid_value(item)) {
            return Err(SendError::invalid_header(name, format!("invalid character in value `{}`", item.escape_debug())));
        }

        self.head.headers.set(name, value);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails when the body has already started.
    pub fn remove_header(&mut self, name: &str) -> Result<Option<RawHeaderValue>, SendError> {
        if self.headers_sent {
            return Err(SendError::headers_sent(name));
        }
        Ok(self.head.headers.remove(name))
    }

    /// Appends a body chunk, freezing the headers.
    pub fn write(&mut self, chunk: &[u8]) {
        self.headers_sent = true;
        self.buffer.extend_from_slice(chunk);
    }

    /// Finishes the response, optionally with a last chunk.
    pub fn end(mut self, chunk: Option<Bytes>) {
        let payload = match chunk {
            Some(chunk) if self.buffer.is_empty() => chunk,
            Some(chunk) => {
                self.buffer.extend_from_slice(&chunk);
                self.buffer.freeze()
            }
            None => self.buffer.freeze(),
        };

        let outcome = ResponseOutcome::Finished { head: self.head, payload };
        if self.sender.send(outcome).is_err() {
            trace!("response ended after its connection went away");
        }
    }

    /// Abandons the response, the connection closes without answering.
    pub fn destroy(self) {
        if self.sender.send(ResponseOutcome::Destroyed).is_err() {
            trace!("response destroyed after its connection went away");
        }
    }
}

/// Values are latin-1 text: tab, visible ASCII, space and the bytes above 0x7f.
fn is_valid_value(value: &str) -> bool {
    value.chars().all(|c| c == '\t' || (' '..='~').contains(&c) || ('\u{80}'..='\u{ff}').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn end_without_body() {
        let (mut response, pending) = ServerResponse::channel();
        response.set_status_code(StatusCode::NO_CONTENT);
        response.end(None);

        let (head, payload) = pending.outcome().await.into_finished().unwrap();
        assert_eq!(head.status(), StatusCode::NO_CONTENT);
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn writes_are_concatenated() {
        let (mut response, pending) = ServerResponse::channel();
        response.write(b"hello ");
        response.end(Some(Bytes::from_static(b"world")));

        let (_head, payload) = pending.outcome().await.into_finished().unwrap();
        assert_eq!(payload, Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn headers_are_frozen_after_write() {
        let (mut response, _pending) = ServerResponse::channel();
        response.set_header("X-Before", "ok").unwrap();
        response.write(b"x");

        assert!(response.headers_sent());
        assert!(matches!(response.set_header("X-After", "nope"), Err(SendError::HeadersSent { .. })));
        assert!(response.remove_header("x-before").is_err());
    }

    #[tokio::test]
    async fn rejects_invalid_headers() {
        let (mut response, _pending) = ServerResponse::channel();

        assert!(response.set_header("bad name", "v").is_err());
        assert!(response.set_header("x-ok", "line\r\nbreak").is_err());
        assert!(response.get_header("x-ok").is_none());
        assert!(response.set_header("x-latin1", "caf\u{e9}").is_ok());
    }

    #[tokio::test]
    async fn dropped_response_is_destroyed() {
        let (response, pending) = ServerResponse::channel();
        drop(response);
        assert!(pending.outcome().await.is_destroyed());

        let (response, pending) = ServerResponse::channel();
        response.destroy();
        assert!(pending.outcome().await.is_destroyed());
    }
}
