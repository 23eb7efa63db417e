//! Request listener abstraction of the raw server.
//!
//! The server calls a [`RequestListener`] once per request with the incoming
//! message and the response to fill in. The listener owns both: it may read the
//! body, set headers and finally [`end`](ServerResponse::end) or
//! [`destroy`](ServerResponse::destroy) the response.
//!
//! Plain async functions become listeners through [`listener_fn`].

use async_trait::async_trait;

use crate::protocol::{IncomingMessage, ServerResponse};

#[async_trait]
pub trait RequestListener: Send + Sync {
    async fn on_request(&self, request: IncomingMessage, response: ServerResponse);
}

/// A [`RequestListener`] built from an async function.
#[derive(Debug)]
pub struct ListenerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> RequestListener for ListenerFn<F>
where
    F: Fn(IncomingMessage, ServerResponse) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_request(&self, request: IncomingMessage, response: ServerResponse) {
        (self.f)(request, response).await;
    }
}

pub fn listener_fn<F, Fut>(f: F) -> ListenerFn<F>
where
    F: Fn(IncomingMessage, ServerResponse) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    ListenerFn { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestHead;
    use crate::protocol::body::IncomingBody;
    use bytes::Bytes;
    use http::StatusCode;

    #[tokio::test]
    async fn listener_fn_receives_request_and_response() {
        let listener = listener_fn(|request: IncomingMessage, mut response: ServerResponse| async move {
            response.set_status_code(StatusCode::ACCEPTED);
            response.end(Some(Bytes::from(request.url().to_owned())));
        });

        let (response, pending) = ServerResponse::channel();
        let request = IncomingMessage::new(RequestHead::new("GET", "/echo"), IncomingBody::empty());
        listener.on_request(request, response).await;

        let (head, payload) = pending.outcome().await.into_finished().unwrap();
        assert_eq!(head.status(), StatusCode::ACCEPTED);
        assert_eq!(payload, Bytes::from_static(b"/echo"));
    }
}
