//! Translation of a raw request head and body into an `http::Request`.

use http::uri::Scheme;
use http::{Method, Request, Uri};
use raw_http::protocol::body::IncomingBody;
use raw_http::protocol::{RawHeaderValue, RequestHead};

use crate::body::RequestBody;
use crate::headers::create_headers;
use crate::AdapterError;

/// Largest frame a streamed request body hands to the application, in bytes.
pub const HIGH_WATER_MARK: usize = 16384;

/// Builds the request the application sees.
///
/// The URL is `http://{host}{target}` with the request target kept exactly as
/// received, repeated slashes included. `GET` and `HEAD` requests get an empty
/// body even when the client sent one; every other method streams `body`.
///
/// # Errors
///
/// - [`AdapterError::InvalidUrl`] without a usable `Host` header or with a target
///   that is not a path
/// - [`AdapterError::InvalidMethod`] when the method is not a valid token
/// - [`AdapterError::InvalidHeader`] when a header cannot be represented
pub fn create_request(head: &RequestHead, body: IncomingBody) -> Result<Request<RequestBody>, AdapterError> {
    let method = Method::from_bytes(head.method().as_bytes()).map_err(|_e| AdapterError::invalid_method(head.method()))?;

    let uri = create_uri(head)?;
    let headers = create_headers(head.headers())?;

    let body = if method == Method::GET || method == Method::HEAD { RequestBody::empty() } else { RequestBody::stream(body) };

    let mut request = Request::new(body);
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.version_mut() = head.version();
    *request.headers_mut() = headers;
    Ok(request)
}

fn create_uri(head: &RequestHead) -> Result<Uri, AdapterError> {
    let host = head.headers().get("host").and_then(RawHeaderValue::first).ok_or_else(|| AdapterError::invalid_url("missing host header"))?;

    let target = head.url();
    if !target.starts_with('/') {
        return Err(AdapterError::invalid_url(format!("request target `{target}` is not a path")));
    }

    Uri::builder().scheme(Scheme::HTTP).authority(host).path_and_query(target).build().map_err(AdapterError::invalid_url)
}
