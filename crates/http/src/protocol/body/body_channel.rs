use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHead};
use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt, channel::mpsc};
use http_body::{Body, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::error;

pub(crate) fn create_body_sender_receiver<S>(body_stream: &mut S, payload_size: PayloadSize) -> (BodySender<'_, S>, BodyReceiver)
where
    S: Stream<Item = Result<Message<(RequestHead, PayloadSize)>, ParseError>> + Unpin,
{
    let (signal_sender, signal_receiver) = mpsc::channel(8);
    let (data_sender, data_receiver) = mpsc::channel(8);

    (BodySender::new(body_stream, signal_receiver, data_sender), BodyReceiver::new(signal_sender, data_receiver, payload_size))
}

pub(crate) enum BodyRequestSignal {
    RequestData,
}

/// Producer side: reads payload items off the connection only when the receiver asks.
pub(crate) struct BodySender<'conn, S> {
    payload_stream: &'conn mut S,
    signal_receiver: mpsc::Receiver<BodyRequestSignal>,
    data_sender: mpsc::Sender<Result<PayloadItem, ParseError>>,
    eof: bool,
    failed: bool,
}

impl<'conn, S> BodySender<'conn, S>
where
    S: Stream<Item = Result<Message<(RequestHead, PayloadSize)>, ParseError>> + Unpin,
{
    pub fn new(
        payload_stream: &'conn mut S,
        signal_receiver: mpsc::Receiver<BodyRequestSignal>,
        data_sender: mpsc::Sender<Result<PayloadItem, ParseError>>,
    ) -> Self {
        Self { payload_stream, signal_receiver, data_sender, eof: false, failed: false }
    }

    /// Serves data requests until the payload is exhausted or the receiver is dropped.
    pub(crate) async fn start(&mut self) -> Result<(), ParseError> {
        if self.eof {
            return Ok(());
        }

        while let Some(BodyRequestSignal::RequestData) = self.signal_receiver.next().await {
            match self.read_data().await {
                Ok(payload_item) => {
                    self.eof = payload_item.is_eof();
                    if let Err(e) = self.data_sender.send(Ok(payload_item)).await {
                        // the receiver went away between asking and receiving, the rest is drained later
                        error!("failed to send payload body through channel, {}", e);
                    }

                    if self.eof {
                        return Ok(());
                    }
                }

                Err(e) => {
                    error!("failed to read data from body stream, {}", e);
                    self.failed = true;
                    let reason = e.to_string();
                    if let Err(send_error) = self.data_sender.send(Err(e)).await {
                        error!("failed to send error through channel, {}", send_error);
                    }
                    return Err(ParseError::invalid_body(reason));
                }
            }
        }

        Ok(())
    }

    async fn read_data(&mut self) -> Result<PayloadItem, ParseError> {
        match self.payload_stream.next().await {
            Some(Ok(Message::Payload(payload_item))) => Ok(payload_item),
            Some(Ok(Message::Header(_))) => {
                error!("should not receive header in BodySender");
                Err(ParseError::invalid_body("should not receive header in BodySender"))
            }
            Some(Err(e)) => Err(e),
            None => {
                error!("connection closed before the request body was complete");
                Err(ParseError::invalid_body("connection closed before the request body was complete"))
            }
        }
    }

    /// Drains whatever the listener left unread so the connection can serve the next request.
    pub(crate) async fn skip_data(&mut self) -> Result<usize, ParseError> {
        if self.failed {
            return Err(ParseError::invalid_body("request body stream already failed"));
        }

        let mut skipped = 0;
        while !self.eof {
            match self.read_data().await? {
                PayloadItem::Eof => self.eof = true,
                PayloadItem::Chunk(bytes) => skipped += bytes.len(),
            }
        }
        Ok(skipped)
    }
}

/// Consumer side: asks for one payload item at a time.
#[derive(Debug)]
pub(crate) struct BodyReceiver {
    signal_sender: mpsc::Sender<BodyRequestSignal>,
    data_receiver: mpsc::Receiver<Result<PayloadItem, ParseError>>,
    payload_size: PayloadSize,
    in_flight: bool,
    finished: bool,
}

impl BodyReceiver {
    pub(crate) fn new(
        signal_sender: mpsc::Sender<BodyRequestSignal>,
        data_receiver: mpsc::Receiver<Result<PayloadItem, ParseError>>,
        payload_size: PayloadSize,
    ) -> Self {
        let finished = payload_size.is_empty();
        Self { signal_sender, data_receiver, payload_size, in_flight: false, finished }
    }
}

impl Body for BodyReceiver {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        if !this.in_flight {
            match Pin::new(&mut this.signal_sender).poll_ready(cx) {
                Poll::Ready(Ok(())) => {
                    if let Err(e) = Pin::new(&mut this.signal_sender).start_send(BodyRequestSignal::RequestData) {
                        error!("failed to send request_more through channel, {}", e);
                        return Poll::Ready(Some(Err(ParseError::invalid_body("failed to send signal when receive body data"))));
                    }
                    this.in_flight = true;
                }
                Poll::Ready(Err(e)) => {
                    error!("failed to prepare request_more through channel, {}", e);
                    return Poll::Ready(Some(Err(ParseError::invalid_body("failed to send signal when receive body data"))));
                }
                Poll::Pending => return Poll::Pending,
            }
        }

        match this.data_receiver.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(PayloadItem::Chunk(bytes)))) => {
                this.in_flight = false;
                Poll::Ready(Some(Ok(Frame::data(bytes))))
            }
            Poll::Ready(Some(Ok(PayloadItem::Eof))) => {
                this.in_flight = false;
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                this.in_flight = false;
                this.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.in_flight = false;
                this.finished = true;
                Poll::Ready(Some(Err(ParseError::invalid_body("body stream should not receive None when receive data"))))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.finished
    }

    fn size_hint(&self) -> SizeHint {
        self.payload_size.into()
    }
}

impl From<PayloadSize> for SizeHint {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(length) => SizeHint::with_exact(length),
            PayloadSize::Chunked => SizeHint::new(),
            PayloadSize::Empty => SizeHint::with_exact(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::channel::mpsc;
    use futures::task::noop_waker_ref;
    use futures::{FutureExt, StreamExt};
    use std::pin::Pin;
    use std::task::{Context, Poll};

    #[tokio::test]
    async fn body_receiver_only_requests_once_until_response() {
        let (signal_sender, mut signal_receiver) = mpsc::channel(8);
        let (mut data_sender, data_receiver) = mpsc::channel(8);
        let mut body_receiver = BodyReceiver::new(signal_sender, data_receiver, PayloadSize::new_chunked());

        let waker = noop_waker_ref();
        let mut cx = Context::from_waker(waker);

        assert!(matches!(Pin::new(&mut body_receiver).poll_frame(&mut cx), Poll::Pending));
        assert!(matches!(signal_receiver.next().await, Some(BodyRequestSignal::RequestData)));

        assert!(matches!(Pin::new(&mut body_receiver).poll_frame(&mut cx), Poll::Pending));
        assert!(signal_receiver.next().now_or_never().is_none());

        data_sender.try_send(Ok(PayloadItem::Chunk(Bytes::from_static(b"hello")))).expect("send chunk");

        match Pin::new(&mut body_receiver).poll_frame(&mut cx) {
            Poll::Ready(Some(Ok(frame))) => {
                let data = frame.into_data().expect("expected data frame");
                assert_eq!(data, Bytes::from_static(b"hello"));
            }
            other => panic!("unexpected poll result: {:?}", other),
        }

        assert!(matches!(Pin::new(&mut body_receiver).poll_frame(&mut cx), Poll::Pending));
        assert!(matches!(signal_receiver.next().await, Some(BodyRequestSignal::RequestData)));

        data_sender.try_send(Ok(PayloadItem::Eof)).expect("send eof");

        assert!(matches!(Pin::new(&mut body_receiver).poll_frame(&mut cx), Poll::Ready(None)));
        assert!(body_receiver.is_end_stream());
    }

    #[tokio::test]
    async fn empty_payload_never_signals() {
        let (signal_sender, mut signal_receiver) = mpsc::channel(8);
        let (_data_sender, data_receiver) = mpsc::channel(8);
        let mut body_receiver = BodyReceiver::new(signal_sender, data_receiver, PayloadSize::new_empty());

        let waker = noop_waker_ref();
        let mut cx = Context::from_waker(waker);

        assert!(body_receiver.is_end_stream());
        assert!(matches!(Pin::new(&mut body_receiver).poll_frame(&mut cx), Poll::Ready(None)));
        assert!(signal_receiver.next().now_or_never().is_none());
    }
}
