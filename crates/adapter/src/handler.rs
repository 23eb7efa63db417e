//! Handler invocation: the [`RequestListener`] that runs an application build.
//!
//! A [`RequestHandler`] turns every raw request into an `http::Request`, asks the
//! current [`ServerBuild`] for a response and writes that response back onto the
//! raw [`ServerResponse`].

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use http::{Request, Response, StatusCode};
use raw_http::handler::RequestListener;
use raw_http::protocol::{IncomingMessage, RequestHead, ServerResponse};
use tracing::{error, warn};

use crate::body::{RequestBody, ResponseBody};
use crate::build::BuildRef;
use crate::error::{AdapterError, BoxError};
use crate::mode::{FailurePolicy, Mode};
use crate::request::create_request;
use crate::response::send_response;

/// An application build: an opaque function from request to response.
#[cfg_attr(test, mockall::automock(type Context = u32;))]
#[async_trait]
pub trait ServerBuild: Send + Sync + 'static {
    /// Per-request value produced by the context provider, never inspected here.
    type Context: Send + 'static;

    async fn handle_request(
        &self,
        request: Request<RequestBody>,
        mode: Mode,
        context: Option<Self::Context>,
    ) -> Result<Response<ResponseBody>, BoxError>;
}

/// A [`ServerBuild`] built from an async function.
#[derive(Debug)]
pub struct BuildFn<F, C> {
    f: F,
    _context: PhantomData<fn(C)>,
}

#[async_trait]
impl<F, Fut, C> ServerBuild for BuildFn<F, C>
where
    F: Fn(Request<RequestBody>, Mode, Option<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<ResponseBody>, BoxError>> + Send + 'static,
    C: Send + 'static,
{
    type Context = C;

    async fn handle_request(
        &self,
        request: Request<RequestBody>,
        mode: Mode,
        context: Option<Self::Context>,
    ) -> Result<Response<ResponseBody>, BoxError> {
        (self.f)(request, mode, context).await
    }
}

pub fn build_fn<C, F, Fut>(f: F) -> BuildFn<F, C>
where
    F: Fn(Request<RequestBody>, Mode, Option<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<ResponseBody>, BoxError>> + Send + 'static,
    C: Send + 'static,
{
    BuildFn { f, _context: PhantomData }
}

/// Computes the application context from the raw request head and response.
pub type LoadContextFn<C> = Box<dyn Fn(&RequestHead, &ServerResponse) -> C + Send + Sync>;

/// Starts configuring a [`RequestHandler`] around a fixed `build`.
///
/// Use [`RequestHandlerBuilder::new`] with a [`BuildRef`] to swap builds later.
pub fn create_request_handler<B: ServerBuild>(build: B) -> RequestHandlerBuilder<B> {
    RequestHandlerBuilder::new(BuildRef::new(build))
}

pub struct RequestHandlerBuilder<B: ServerBuild> {
    build: BuildRef<B>,
    mode: Mode,
    load_context: Option<LoadContextFn<B::Context>>,
    failure_policy: FailurePolicy,
}

impl<B: ServerBuild> RequestHandlerBuilder<B> {
    pub fn new(build: BuildRef<B>) -> Self {
        Self { build, mode: Mode::default(), load_context: None, failure_policy: FailurePolicy::default() }
    }

    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the context provider, called once per request before the build runs.
    #[must_use]
    pub fn get_load_context<F>(mut self, load_context: F) -> Self
    where
        F: Fn(&RequestHead, &ServerResponse) -> B::Context + Send + Sync + 'static,
    {
        self.load_context = Some(Box::new(load_context));
        self
    }

    #[must_use]
    pub fn failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn build(self) -> RequestHandler<B> {
        RequestHandler {
            build: self.build,
            mode: self.mode,
            load_context: self.load_context,
            failure_policy: self.failure_policy,
        }
    }
}

impl<B: ServerBuild> fmt::Debug for RequestHandlerBuilder<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandlerBuilder")
            .field("mode", &self.mode)
            .field("load_context", &self.load_context.is_some())
            .field("failure_policy", &self.failure_policy)
            .finish_non_exhaustive()
    }
}

pub struct RequestHandler<B: ServerBuild> {
    build: BuildRef<B>,
    mode: Mode,
    load_context: Option<LoadContextFn<B::Context>>,
    failure_policy: FailurePolicy,
}

impl<B: ServerBuild> RequestHandler<B> {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The build reference requests read from, swap it to serve a new build.
    pub fn build_ref(&self) -> &BuildRef<B> {
        &self.build
    }

    /// Serves one raw request with the current build.
    ///
    /// # Errors
    ///
    /// Returns the error of the translation, of the build or of writing the
    /// response. On translation and build errors the raw response is handled
    /// according to the [`FailurePolicy`] before returning.
    pub async fn handle(&self, request: IncomingMessage, response: ServerResponse) -> Result<(), AdapterError> {
        let (head, body) = request.into_parts();

        let request = match create_request(&head, body) {
            Ok(request) => request,
            Err(e) => return Err(self.fail(response, e)),
        };

        let context = self.load_context.as_ref().map(|load_context| load_context(&head, &response));

        let build = self.build.load();
        match build.handle_request(request, self.mode, context).await {
            Ok(message) => send_response(response, message).await,
            Err(e) => Err(self.fail(response, AdapterError::handler(e))),
        }
    }

    fn fail(&self, mut response: ServerResponse, error: AdapterError) -> AdapterError {
        match self.failure_policy {
            FailurePolicy::Drop => drop(response),
            FailurePolicy::InternalServerError => {
                response.set_status_code(StatusCode::INTERNAL_SERVER_ERROR);
                response.end(None);
            }
        }
        error
    }
}

impl<B: ServerBuild> fmt::Debug for RequestHandler<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler")
            .field("mode", &self.mode)
            .field("load_context", &self.load_context.is_some())
            .field("failure_policy", &self.failure_policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<B: ServerBuild> RequestListener for RequestHandler<B> {
    async fn on_request(&self, request: IncomingMessage, response: ServerResponse) {
        let method = request.method().to_owned();
        let url = request.url().to_owned();

        if let Err(e) = self.handle(request, response).await {
            match e {
                AdapterError::ResponseBody { .. } => warn!(cause = %e, method, url, "response body failed, response destroyed"),
                _ => error!(cause = %e, method, url, "failed to handle request"),
            }
        }
    }
}
