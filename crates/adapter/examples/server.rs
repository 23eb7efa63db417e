use std::error::Error;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use raw_http_adapter::{BoxError, Mode, RequestBody, ResponseBody, Server, build_fn, create_request_handler};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mode = Mode::resolve(std::env::var("NODE_ENV").ok().as_deref());
    let port = std::env::var("PORT").ok().and_then(|port| port.parse::<u16>().ok()).unwrap_or(3000);

    let handler = create_request_handler(build_fn(app)).mode(mode).build();

    info!(port, %mode, "starting server");
    Server::builder().address(("0.0.0.0", port)).listener(handler).build()?.start().await?;
    Ok(())
}

async fn app(request: Request<RequestBody>, mode: Mode, _context: Option<()>) -> Result<Response<ResponseBody>, BoxError> {
    info!(method = %request.method(), uri = %request.uri(), "receive request");

    match request.uri().path() {
        "/" => Ok(Response::new(ResponseBody::from(format!("hello from {mode}\n")))),
        "/echo" => {
            let body = request.into_body().collect().await?.to_bytes();
            Ok(Response::new(ResponseBody::from(body)))
        }
        "/empty" => Ok(Response::builder().status(StatusCode::NO_CONTENT).body(ResponseBody::null())?),
        _ => Ok(Response::builder().status(StatusCode::NOT_FOUND).body(ResponseBody::from(Bytes::from_static(b"not found\n")))?),
    }
}
