//! Incoming request representation.
//!
//! A request is split into its [`RequestHead`] (method, request target, version
//! and raw headers) and an [`IncomingBody`]. Nothing in the head is normalized:
//! the request target is kept exactly as it appeared on the request line.

use http::Version;

use crate::protocol::body::IncomingBody;
use crate::protocol::{RawHeaderValue, RawHeaders};

/// The head of an incoming HTTP request.
#[derive(Debug, Clone)]
pub struct RequestHead {
    method: String,
    url: String,
    version: Version,
    headers: RawHeaders,
}

impl RequestHead {
    /// Creates a HTTP/1.1 head with no headers.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into(), url: url.into(), version: Version::HTTP_11, headers: RawHeaders::new() }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Sets a header, replacing any previous value of the same name.
    pub fn with_header(mut self, name: &str, value: impl Into<RawHeaderValue>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Returns the request method exactly as received, e.g. `"GET"`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the request target exactly as received, e.g. `"//foo//bar?x=1"`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &RawHeaders {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut RawHeaders {
        &mut self.headers
    }

    /// Whether the connection may be reused after this request.
    ///
    /// HTTP/1.1 defaults to keep-alive unless `Connection: close` is present,
    /// HTTP/1.0 only keeps the connection with an explicit `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        let connection = self.headers.get("connection").map(RawHeaderValue::joined);
        let has_token = |token: &str| {
            connection.as_deref().is_some_and(|value| value.split(',').any(|item| item.trim().eq_ignore_ascii_case(token)))
        };

        match self.version {
            Version::HTTP_11 => !has_token("close"),
            _ => has_token("keep-alive"),
        }
    }

    /// Whether the client asked for `100 Continue` before sending the body.
    pub fn expects_continue(&self) -> bool {
        self.headers
            .get("expect")
            .and_then(RawHeaderValue::first)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("100-continue"))
    }
}

/// A request handed to a [`RequestListener`](crate::handler::RequestListener).
#[derive(Debug)]
pub struct IncomingMessage {
    head: RequestHead,
    body: IncomingBody,
}

impl IncomingMessage {
    pub fn new(head: RequestHead, body: IncomingBody) -> Self {
        Self { head, body }
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn method(&self) -> &str {
        self.head.method()
    }

    pub fn url(&self) -> &str {
        self.head.url()
    }

    pub fn headers(&self) -> &RawHeaders {
        self.head.headers()
    }

    pub fn body_mut(&mut self) -> &mut IncomingBody {
        &mut self.body
    }

    pub fn into_body(self) -> IncomingBody {
        self.body
    }

    pub fn into_parts(self) -> (RequestHead, IncomingBody) {
        (self.head, self.body)
    }
}
