//! Request body streaming.
//!
//! An [`IncomingBody`] is the readable side of a request. When it is bound to a
//! connection it pulls payload items from the decoder one at a time: nothing is
//! read off the socket until the consumer polls for the next frame, which keeps
//! the amount of buffered body data bounded.
//!
//! The producer side lives in `body_channel` and is driven by the connection
//! concurrently with the listener. Whatever the listener leaves unread is
//! drained afterwards so the connection stays usable for the next request.

mod body_channel;

pub(crate) use body_channel::create_body_sender_receiver;

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};

use crate::protocol::ParseError;
use body_channel::BodyReceiver;

/// The readable body of an [`IncomingMessage`](crate::protocol::IncomingMessage).
#[derive(Debug)]
pub struct IncomingBody {
    kind: Kind,
}

#[derive(Debug)]
enum Kind {
    Empty,
    Full(Option<Bytes>),
    Connection(BodyReceiver),
}

impl IncomingBody {
    pub fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    /// A body that yields `bytes` as a single frame, mostly useful for tests.
    pub fn full(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() { Self::empty() } else { Self { kind: Kind::Full(Some(bytes)) } }
    }

    pub(crate) fn from_connection(receiver: BodyReceiver) -> Self {
        Self { kind: Kind::Connection(receiver) }
    }
}

impl Default for IncomingBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl Body for IncomingBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            Kind::Empty => Poll::Ready(None),
            Kind::Full(bytes) => Poll::Ready(bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            Kind::Connection(receiver) => Pin::new(receiver).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Empty => true,
            Kind::Full(bytes) => bytes.is_none(),
            Kind::Connection(receiver) => receiver.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Empty | Kind::Full(None) => SizeHint::with_exact(0),
            Kind::Full(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Connection(receiver) => receiver.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn full_body_yields_once() {
        let mut body = IncomingBody::full("hello");

        assert_eq!(body.size_hint().exact(), Some(5));
        assert!(!body.is_end_stream());

        let bytes = body.frame().await.unwrap().unwrap().into_data().unwrap();
        assert_eq!(bytes, Bytes::from_static(b"hello"));
        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn empty_body() {
        let body = IncomingBody::full("");
        assert!(body.is_end_stream());
        assert_eq!(body.collect().await.unwrap().to_bytes(), Bytes::new());
    }
}
