//! Adapter and server errors.

use std::error::Error;
use std::io;

use raw_http::protocol::SendError;
use thiserror::Error;

/// Error type at the application boundary.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Errors raised while serving one request through the adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid request url: {reason}")]
    InvalidUrl { reason: String },

    #[error("invalid request method: {method}")]
    InvalidMethod { method: String },

    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("request handler failed: {source}")]
    Handler { source: BoxError },

    #[error("response body failed: {source}")]
    ResponseBody { source: BoxError },

    #[error("send response error: {source}")]
    Send {
        #[from]
        source: SendError,
    },
}

impl AdapterError {
    pub fn invalid_url<S: ToString>(reason: S) -> Self {
        Self::InvalidUrl { reason: reason.to_string() }
    }

    pub fn invalid_method<S: ToString>(method: S) -> Self {
        Self::InvalidMethod { method: method.to_string() }
    }

    pub fn invalid_header<N: ToString, S: ToString>(name: N, reason: S) -> Self {
        Self::InvalidHeader { name: name.to_string(), reason: reason.to_string() }
    }

    pub fn handler<E: Into<BoxError>>(e: E) -> Self {
        Self::Handler { source: e.into() }
    }

    pub fn response_body<E: Into<BoxError>>(e: E) -> Self {
        Self::ResponseBody { source: e.into() }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("address must be set")]
    MissingAddress,

    #[error("request handler must be set")]
    MissingHandler,

    #[error("invalid address: {source}")]
    InvalidAddress { source: io::Error },

    #[error("bind server error: {source}")]
    Bind { source: io::Error },
}
