use async_trait::async_trait;
use http::{Request, Response};
use raw_http::handler::RequestListener;
use raw_http::protocol::{IncomingMessage, ServerResponse};
use raw_http_adapter::{BoxError, Mode, RequestBody, ResponseBody, Server, ServerError, build_fn, create_request_handler};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn hello_handler() -> raw_http_adapter::RequestHandler<impl raw_http_adapter::ServerBuild<Context = ()>> {
    let build = build_fn(|request: Request<RequestBody>, mode: Mode, _context: Option<()>| async move {
        Ok::<_, BoxError>(Response::new(ResponseBody::from(format!("{mode} {}", request.uri().path()))))
    });
    create_request_handler(build).mode(Mode::Test).build()
}

#[tokio::test]
async fn serves_over_tcp() {
    let tcp_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = tcp_listener.local_addr().unwrap();

    let server = Server::builder().address(address).listener(hello_handler()).build().unwrap();
    let server_task = tokio::spawn(server.serve(tcp_listener));

    let mut stream = TcpStream::connect(address).await.unwrap();
    stream.write_all(b"GET /hello HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await.unwrap();

    let mut output = String::new();
    stream.read_to_string(&mut output).await.unwrap();
    server_task.abort();

    assert_eq!(output, "HTTP/1.1 200 OK\r\ncontent-length: 11\r\nconnection: close\r\n\r\ntest /hello");
}

struct Unanswered;

#[async_trait]
impl RequestListener for Unanswered {
    async fn on_request(&self, _request: IncomingMessage, response: ServerResponse) {
        response.destroy();
    }
}

#[test]
fn builder_requires_address_and_listener() {
    let missing_address = Server::builder().listener(Unanswered).build();
    assert!(matches!(missing_address, Err(ServerError::MissingAddress)));

    let missing_listener = Server::<Unanswered>::builder().address("127.0.0.1:0").build();
    assert!(matches!(missing_listener, Err(ServerError::MissingHandler)));

    let invalid_address = Server::builder().address("not an address").listener(Unanswered).build();
    assert!(matches!(invalid_address, Err(ServerError::InvalidAddress { .. })));
}
