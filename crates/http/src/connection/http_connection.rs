use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::{StatusCode, Version};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::select;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info, warn};

use crate::codec::{OutgoingResponse, RequestDecoder, ResponseEncoder};
use crate::handler::RequestListener;
use crate::protocol::body::{IncomingBody, create_body_sender_receiver};
use crate::protocol::{
    HttpError, IncomingMessage, Message, ParseError, PayloadSize, RequestHead, ResponseHead, ResponseOutcome, SendError, ServerResponse,
};

/// An HTTP/1.1 connection that feeds every request to a [`RequestListener`].
///
/// For each request the connection:
/// - answers `Expect: 100-continue` before the listener runs
/// - streams the request body to the listener on demand
/// - drains any body the listener left unread
/// - writes the response once the listener ended it, or closes when it was destroyed
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    /// Serves requests until the peer closes, a request asks to close, or a
    /// response is destroyed.
    ///
    /// # Errors
    ///
    /// Returns the [`HttpError`] that broke the connection. A malformed request is
    /// answered with `400 Bad Request` first.
    pub async fn process<L>(mut self, listener: Arc<L>) -> Result<(), HttpError>
    where
        L: RequestListener,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(Message::Header((head, payload_size)))) => {
                    if !self.do_process(head, payload_size, &listener).await? {
                        info!("close connection after response");
                        return Ok(());
                    }
                }

                Some(Ok(Message::Payload(_))) => {
                    error!("receive payload while waiting for a request head");
                    self.send_error_response(StatusCode::BAD_REQUEST).await?;
                    return Err(ParseError::invalid_body("need header while receive body").into());
                }

                Some(Err(e)) => {
                    error!(cause = %e, "can't receive next request");
                    self.send_error_response(StatusCode::BAD_REQUEST).await?;
                    return Err(e.into());
                }

                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
            }
        }
    }

    /// Returns whether the connection stays open for another request.
    async fn do_process<L>(&mut self, head: RequestHead, payload_size: PayloadSize, listener: &Arc<L>) -> Result<bool, HttpError>
    where
        L: RequestListener,
    {
        if head.expects_continue() {
            let writer = self.framed_write.get_mut();
            writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await.map_err(SendError::io)?;
            writer.flush().await.map_err(SendError::io)?;
            info!("receive expect request header, sent continue response");
        }

        let keep_alive = head.keep_alive();
        // HTTP/1.0 peers close unless keep-alive is confirmed
        let announce_keep_alive = keep_alive && head.version() == Version::HTTP_10;
        let skip_payload = head.method() == "HEAD";

        let (response, pending) = ServerResponse::channel();
        let (mut body_sender, body_receiver) = create_body_sender_receiver(&mut self.framed_read, payload_size);
        let request = IncomingMessage::new(head, IncomingBody::from_connection(body_receiver));

        // The listener and the body sender run side by side: the listener may wait
        // for body data that only the sender reads off the connection.
        {
            tokio::pin! {
                let listen_future = listener.on_request(request, response);
                let body_future = body_sender.start();
            }

            let mut body_finished = false;
            loop {
                select! {
                    biased;
                    () = &mut listen_future => break,
                    result = &mut body_future, if !body_finished => {
                        body_finished = true;
                        if let Err(e) = result {
                            warn!(cause = %e, "request body stream failed");
                        }
                    }
                }
            }
        }

        // the next request head sits behind whatever body the listener did not read
        let skipped = body_sender.skip_data().await?;
        if skipped > 0 {
            debug!(skipped, "skipped unread request body");
        }

        match pending.outcome().await {
            ResponseOutcome::Finished { head, payload } => {
                let outgoing = OutgoingResponse::new(head, payload)
                    .skip_payload(skip_payload)
                    .close(!keep_alive)
                    .keep_alive(announce_keep_alive);
                self.framed_write.send(outgoing).await?;
                Ok(keep_alive)
            }
            ResponseOutcome::Destroyed => {
                warn!("response destroyed without being sent, close connection");
                Ok(false)
            }
        }
    }

    async fn send_error_response(&mut self, status: StatusCode) -> Result<(), HttpError> {
        let outgoing = OutgoingResponse::new(ResponseHead::new(status), Bytes::new()).close(true);
        self.framed_write.send(outgoing).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::listener_fn;
    use http_body_util::BodyExt;
    use indoc::indoc;
    use tokio::io::{AsyncReadExt, duplex};

    async fn run<L: RequestListener + 'static>(listener: L, input: &str) -> String {
        let (client, server) = duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let connection = HttpConnection::new(server_read, server_write);
        let task = tokio::spawn(async move { connection.process(Arc::new(listener)).await });

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(input.as_bytes()).await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        let _ = task.await.unwrap();
        output
    }

    #[tokio::test]
    async fn echoes_posted_body() {
        let listener = listener_fn(|request: IncomingMessage, response: ServerResponse| async move {
            let body = request.into_body().collect().await.unwrap().to_bytes();
            response.end(Some(body));
        });

        let input = indoc! {"
            POST /echo HTTP/1.1
            Host: localhost
            Content-Length: 5
            Connection: close

            hello"};

        let output = run(listener, input).await;
        assert_eq!(output, "HTTP/1.1 200 OK\r\ncontent-length: 5\r\nconnection: close\r\n\r\nhello");
    }

    #[tokio::test]
    async fn unread_body_is_skipped_between_requests() {
        let listener = listener_fn(|request: IncomingMessage, response: ServerResponse| async move {
            response.end(Some(Bytes::from(request.url().to_owned())));
        });

        let input = "POST /first HTTP/1.1\r\nHost: localhost\r\nContent-Length: 3\r\n\r\nabcGET /second HTTP/1.1\r\nHost: localhost\r\n\r\n";

        let output = run(listener, input).await;
        assert_eq!(output, "HTTP/1.1 200 OK\r\ncontent-length: 6\r\n\r\n/firstHTTP/1.1 200 OK\r\ncontent-length: 7\r\n\r\n/second");
    }

    #[tokio::test]
    async fn destroyed_response_closes_silently() {
        let listener = listener_fn(|_request: IncomingMessage, response: ServerResponse| async move {
            response.destroy();
        });

        let output = run(listener, "GET / HTTP/1.1\r\nHost: localhost\r\n\r\nGET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert_eq!(output, "");
    }

    #[tokio::test]
    async fn malformed_request_gets_bad_request() {
        let listener = listener_fn(|_request: IncomingMessage, response: ServerResponse| async move {
            response.end(None);
        });

        let output = run(listener, "POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: nope\r\n\r\n").await;
        assert_eq!(output, "HTTP/1.1 400 Bad Request\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
    }

    #[tokio::test]
    async fn expect_continue_is_answered() {
        let listener = listener_fn(|request: IncomingMessage, response: ServerResponse| async move {
            let body = request.into_body().collect().await.unwrap().to_bytes();
            response.end(Some(body));
        });

        let input = "PUT /upload HTTP/1.1\r\nHost: localhost\r\nExpect: 100-continue\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok";

        let output = run(listener, input).await;
        assert_eq!(output, "HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok");
    }

    #[tokio::test]
    async fn conflicting_content_length_is_rejected() {
        let listener = listener_fn(|request: IncomingMessage, response: ServerResponse| async move {
            response.end(Some(Bytes::from(request.url().to_owned())));
        });

        let input = "POST /a HTTP/1.1\r\nHost: localhost\r\nContent-Length: 3\r\nContent-Length: 30\r\n\r\nabcGET /smuggled HTTP/1.1\r\nHost: localhost\r\n\r\n";

        let output = run(listener, input).await;
        assert_eq!(output, "HTTP/1.1 400 Bad Request\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
    }

    #[tokio::test]
    async fn http10_keep_alive_is_confirmed() {
        let listener = listener_fn(|request: IncomingMessage, response: ServerResponse| async move {
            response.end(Some(Bytes::from(request.url().to_owned())));
        });

        let input = "GET /a HTTP/1.0\r\nConnection: keep-alive\r\n\r\nGET /b HTTP/1.0\r\n\r\n";

        let output = run(listener, input).await;
        assert_eq!(
            output,
            concat!(
                "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: keep-alive\r\n\r\n/a",
                "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n/b",
            )
        );
    }
}
