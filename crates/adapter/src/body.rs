//! Bodies on both sides of the application handler.
//!
//! - [`RequestBody`]: what the handler reads, either absent or a pass-through over
//!   the raw request body that never hands out frames above the high-water mark
//! - [`ResponseBody`]: what the handler returns, absent, a single chunk, or a
//!   boxed stream

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;
use pin_project_lite::pin_project;
use raw_http::protocol::ParseError;
use raw_http::protocol::body::IncomingBody;

use crate::error::BoxError;
use crate::request::HIGH_WATER_MARK;

/// The body of a request handed to the application.
#[derive(Debug)]
pub struct RequestBody {
    kind: RequestKind,
}

#[derive(Debug)]
enum RequestKind {
    Empty,
    Stream(PassThrough<IncomingBody>),
}

impl RequestBody {
    /// An absent body: end of stream right away, exact size 0.
    pub fn empty() -> Self {
        Self { kind: RequestKind::Empty }
    }

    /// Streams `body` through in frames of at most [`HIGH_WATER_MARK`] bytes.
    pub fn stream(body: IncomingBody) -> Self {
        Self { kind: RequestKind::Stream(PassThrough::new(body, HIGH_WATER_MARK)) }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl Body for RequestBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            RequestKind::Empty => Poll::Ready(None),
            RequestKind::Stream(pass_through) => Pin::new(pass_through).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            RequestKind::Empty => true,
            RequestKind::Stream(pass_through) => pass_through.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            RequestKind::Empty => SizeHint::with_exact(0),
            RequestKind::Stream(pass_through) => pass_through.size_hint(),
        }
    }
}

pin_project! {
    /// Forwards the frames of `inner`, splitting data frames larger than the
    /// high-water mark. At most one upstream chunk is held at a time.
    #[derive(Debug)]
    pub struct PassThrough<B> {
        #[pin]
        inner: B,
        pending: Option<Bytes>,
        high_water_mark: usize,
    }
}

impl<B> PassThrough<B> {
    /// Wraps `inner`, re-slicing its data frames to at most `high_water_mark` bytes.
    /// A zero mark is treated as one.
    pub fn new(inner: B, high_water_mark: usize) -> Self {
        Self { inner, pending: None, high_water_mark: high_water_mark.max(1) }
    }
}

/// Hands out at most `limit` bytes of `bytes`, leaving the rest in place.
fn take_slice(bytes: &mut Bytes, limit: usize) -> Bytes {
    if bytes.len() > limit { bytes.split_to(limit) } else { std::mem::take(bytes) }
}

impl<B> Body for PassThrough<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();

        if let Some(pending) = this.pending.as_mut() {
            let slice = take_slice(pending, *this.high_water_mark);
            if pending.is_empty() {
                this.pending.take();
            }
            return Poll::Ready(Some(Ok(Frame::data(slice))));
        }

        loop {
            return match ready!(this.inner.as_mut().poll_frame(cx)) {
                Some(Ok(frame)) => match frame.into_data() {
                    Ok(data) if data.is_empty() => continue,
                    Ok(mut data) => {
                        let slice = take_slice(&mut data, *this.high_water_mark);
                        if !data.is_empty() {
                            *this.pending = Some(data);
                        }
                        Poll::Ready(Some(Ok(Frame::data(slice))))
                    }
                    // trailers are passed on untouched
                    Err(frame) => Poll::Ready(Some(Ok(frame))),
                },
                Some(Err(e)) => Poll::Ready(Some(Err(e))),
                None => Poll::Ready(None),
            };
        }
    }

    fn is_end_stream(&self) -> bool {
        self.pending.is_none() && self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        let mut size_hint = self.inner.size_hint();
        let pending = self.pending.as_ref().map_or(0, |bytes| bytes.len() as u64);
        if let Some(upper) = size_hint.upper() {
            size_hint.set_upper(upper + pending);
        }
        size_hint.set_lower(size_hint.lower() + pending);
        size_hint
    }
}

/// The body of a response returned by the application.
///
/// A [`null`](ResponseBody::null) body is absent: the response is ended without
/// content.
#[derive(Debug)]
pub struct ResponseBody {
    kind: ResponseKind,
}

enum ResponseKind {
    Once(Option<Bytes>),
    Stream(UnsyncBoxBody<Bytes, BoxError>),
}

impl std::fmt::Debug for ResponseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseKind::Once(bytes) => f.debug_tuple("Once").field(bytes).finish(),
            ResponseKind::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl ResponseBody {
    pub fn null() -> Self {
        Self { kind: ResponseKind::Once(None) }
    }

    pub fn once(bytes: Bytes) -> Self {
        Self { kind: ResponseKind::Once(Some(bytes)) }
    }

    pub fn stream<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self { kind: ResponseKind::Stream(UnsyncBoxBody::new(body.map_err(Into::into))) }
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<()> for ResponseBody {
    fn from((): ()) -> Self {
        Self::null()
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::once(bytes)
    }
}

impl From<Option<Bytes>> for ResponseBody {
    fn from(option: Option<Bytes>) -> Self {
        match option {
            Some(bytes) => Self::once(bytes),
            None => Self::null(),
        }
    }
}

impl From<&'static str> for ResponseBody {
    fn from(value: &'static str) -> Self {
        Self::once(Bytes::from_static(value.as_bytes()))
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            ResponseKind::Once(option_bytes) => Poll::Ready(option_bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            ResponseKind::Stream(box_body) => Pin::new(box_body).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            ResponseKind::Once(option_bytes) => option_bytes.is_none(),
            ResponseKind::Stream(box_body) => box_body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            ResponseKind::Once(None) => SizeHint::with_exact(0),
            ResponseKind::Once(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            ResponseKind::Stream(box_body) => box_body.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use http_body_util::StreamBody;
    use std::io;

    fn check_send<T: Send>() {}

    #[test]
    fn is_send() {
        check_send::<ResponseBody>();
        check_send::<RequestBody>();
    }

    #[tokio::test]
    async fn empty_request_body() {
        let mut body = RequestBody::empty();

        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn pass_through_splits_large_frames() {
        let payload = Bytes::from(vec![7u8; 40_000]);
        let mut body = RequestBody::stream(IncomingBody::full(payload.clone()));

        let mut lengths = vec![];
        let mut collected = Vec::new();
        while let Some(frame) = body.frame().await {
            let data = frame.unwrap().into_data().unwrap();
            lengths.push(data.len());
            collected.extend_from_slice(&data);
        }

        assert_eq!(lengths, vec![16384, 16384, 7232]);
        assert_eq!(collected, payload);
        assert!(body.is_end_stream());
    }

    #[tokio::test]
    async fn pass_through_keeps_small_frames() {
        let mut body = PassThrough::new(IncomingBody::full("hello"), 16);

        assert_eq!(body.size_hint().exact(), Some(5));
        assert_eq!(body.frame().await.unwrap().unwrap().into_data().unwrap(), Bytes::from_static(b"hello"));
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn null_response_body() {
        let mut body = ResponseBody::null();

        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn once_response_body() {
        let mut body = ResponseBody::from("Hello world");

        assert_eq!(body.size_hint().exact(), Some(11));
        assert!(!body.is_end_stream());
        assert_eq!(body.frame().await.unwrap().unwrap().into_data().unwrap(), Bytes::from_static(b"Hello world"));
        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn stream_response_body() {
        let chunks: Vec<Result<_, io::Error>> =
            vec![Ok(Frame::data(Bytes::from_static(b"hello"))), Ok(Frame::data(Bytes::from_static(b" world")))];
        let mut body = ResponseBody::stream(StreamBody::new(stream::iter(chunks)));

        assert!(body.size_hint().exact().is_none());
        assert!(!body.is_end_stream());

        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(collected, Bytes::from_static(b"hello world"));
    }
}
