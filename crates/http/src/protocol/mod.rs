//! Core HTTP protocol types of the raw server.
//!
//! The types here mirror what a Node-style HTTP server hands to its request
//! listener:
//!
//! - **Headers** ([`headers`]): [`RawHeaders`] maps lowercase names to a
//!   [`RawHeaderValue`], either a single string or an ordered list of strings
//!
//! - **Request** ([`request`]): [`RequestHead`] keeps the method and request
//!   target exactly as received, [`IncomingMessage`] pairs it with a body
//!
//! - **Response** ([`response`]): [`ServerResponse`] collects status, headers and
//!   payload, [`ResponseOutcome`] is what the connection finally writes
//!
//! - **Body Streaming** ([`body`]): [`IncomingBody`] implements `http_body::Body`
//!   and pulls request payload on demand
//!
//! - **Message Handling** ([`message`]): decoder items, [`Message`],
//!   [`PayloadItem`] and [`PayloadSize`]
//!
//! - **Error Handling** ([`error`]): [`HttpError`], [`ParseError`], [`SendError`]

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod headers;
pub use headers::RawHeaderValue;
pub use headers::RawHeaders;

mod request;
pub use request::IncomingMessage;
pub use request::RequestHead;

mod response;
pub use response::PendingResponse;
pub use response::ResponseHead;
pub use response::ResponseOutcome;
pub use response::ServerResponse;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;
