//! Materialization of an `http::Response` onto a raw [`ServerResponse`].

use bytes::{Bytes, BytesMut};
use http::Response;
use http_body::Body;
use http_body_util::BodyExt;
use raw_http::protocol::{RawHeaderValue, ServerResponse};
use tracing::trace;

use crate::AdapterError;
use crate::error::BoxError;
use crate::headers::latin1;

/// Writes `message` onto `response` and ends it.
///
/// Every header name is set with all of its values in one call, so repeated
/// headers such as `Set-Cookie` stay separate lines on the wire. A body that is
/// already at its end is treated as absent and the response ends without
/// content; otherwise the body is read to completion first.
///
/// # Errors
///
/// - [`AdapterError::Send`] when a header is rejected by the raw response
/// - [`AdapterError::ResponseBody`] when the body fails, the response is destroyed
pub async fn send_response<B>(mut response: ServerResponse, message: Response<B>) -> Result<(), AdapterError>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    let (parts, mut body) = message.into_parts();

    response.set_status_code(parts.status);

    for name in parts.headers.keys() {
        let mut values = parts.headers.get_all(name).iter().map(|value| latin1(value.as_bytes())).collect::<Vec<_>>();
        let value = if values.len() == 1 { RawHeaderValue::Single(values.remove(0)) } else { RawHeaderValue::Multiple(values) };
        response.set_header(name.as_str(), value)?;
    }

    if body.is_end_stream() {
        trace!(status = %parts.status, "send response without body");
        response.end(None);
        return Ok(());
    }

    let mut payload = BytesMut::new();
    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                // trailers have no place in a buffered response
                if let Ok(data) = frame.into_data() {
                    payload.extend_from_slice(&data);
                }
            }
            Err(e) => {
                response.destroy();
                return Err(AdapterError::response_body(e));
            }
        }
    }

    trace!(status = %parts.status, size = payload.len(), "send response");
    response.end(Some(payload.freeze()));
    Ok(())
}
