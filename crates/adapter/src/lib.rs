//! Runs an application handler that speaks `http::Request` / `http::Response`
//! behind the raw Node-style server of the `raw-http` crate.
//!
//! For every raw request the adapter:
//!
//! 1. builds an `http::Request<RequestBody>` ([`create_request`]): the URL is
//!    `http://{host}{target}` with the target kept verbatim, headers are
//!    reconciled by [`create_headers`], and the body streams through for every
//!    method except `GET` and `HEAD`
//! 2. calls the current [`ServerBuild`] once, with the [`Mode`] and the optional
//!    per-request context
//! 3. writes the returned response onto the raw response ([`send_response`]),
//!    keeping repeated headers as separate lines
//!
//! # Example
//!
//! ```no_run
//! use http::{Request, Response};
//! use raw_http_adapter::{BoxError, Mode, RequestBody, ResponseBody, Server, build_fn, create_request_handler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let build = build_fn(|request: Request<RequestBody>, mode: Mode, _context: Option<()>| async move {
//!         let text = format!("{} {} in {mode}", request.method(), request.uri().path());
//!         Ok::<_, BoxError>(Response::new(ResponseBody::from(text)))
//!     });
//!
//!     let handler = create_request_handler(build).mode(Mode::resolve(Some("development"))).build();
//!
//!     Server::builder().address("127.0.0.1:3000").listener(handler).build()?.start().await?;
//!     Ok(())
//! }
//! ```

mod body;
mod build;
mod error;
mod handler;
mod headers;
mod mode;
mod request;
mod response;
mod server;

pub use body::PassThrough;
pub use body::RequestBody;
pub use body::ResponseBody;
pub use build::BuildRef;
pub use error::AdapterError;
pub use error::BoxError;
pub use error::ServerError;
pub use handler::BuildFn;
pub use handler::LoadContextFn;
pub use handler::RequestHandler;
pub use handler::RequestHandlerBuilder;
pub use handler::ServerBuild;
pub use handler::build_fn;
pub use handler::create_request_handler;
pub use headers::HeadersExt;
pub use headers::create_headers;
pub use mode::FailurePolicy;
pub use mode::Mode;
pub use request::HIGH_WATER_MARK;
pub use request::create_request;
pub use response::send_response;
pub use server::Server;
pub use server::ServerBuilder;
