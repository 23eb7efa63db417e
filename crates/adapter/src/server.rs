use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use raw_http::connection::HttpConnection;
use raw_http::handler::RequestListener;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::ServerError;

/// Builder for a [`Server`].
#[derive(Debug)]
pub struct ServerBuilder<L> {
    address: Option<std::io::Result<Vec<SocketAddr>>>,
    listener: Option<L>,
}

impl<L: RequestListener + 'static> ServerBuilder<L> {
    fn new() -> Self {
        Self { address: None, listener: None }
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    /// Sets the listener every request goes to, usually a
    /// [`RequestHandler`](crate::RequestHandler).
    pub fn listener(mut self, listener: L) -> Self {
        self.listener = Some(listener);
        self
    }

    /// # Errors
    ///
    /// Fails when the address or the listener is missing, or the address does not resolve.
    pub fn build(self) -> Result<Server<L>, ServerError> {
        let address = self.address.ok_or(ServerError::MissingAddress)?.map_err(|source| ServerError::InvalidAddress { source })?;
        let listener = self.listener.ok_or(ServerError::MissingHandler)?;
        Ok(Server { address, listener: Arc::new(listener) })
    }
}

/// A TCP server handing every connection to a raw [`HttpConnection`].
#[derive(Debug)]
pub struct Server<L> {
    address: Vec<SocketAddr>,
    listener: Arc<L>,
}

impl<L: RequestListener + 'static> Server<L> {
    pub fn builder() -> ServerBuilder<L> {
        ServerBuilder::new()
    }

    /// Binds the address and accepts connections until the task is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when the address cannot be bound. Failed
    /// accepts are logged and skipped.
    pub async fn start(self) -> Result<(), ServerError> {
        let tcp_listener = TcpListener::bind(self.address.as_slice()).await.map_err(|source| {
            error!(cause = %source, "bind server error");
            ServerError::Bind { source }
        })?;

        info!(address = ?self.address, "start listening");
        self.serve(tcp_listener).await;
        Ok(())
    }

    /// Accepts connections from an already bound `tcp_listener`.
    pub async fn serve(self, tcp_listener: TcpListener) {
        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let listener = Arc::clone(&self.listener);

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::new(reader, writer);
                match connection.process(listener).await {
                    Ok(()) => {
                        info!(%remote_addr, "finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!(cause = %e, %remote_addr, "service has error, connection shutdown");
                    }
                }
            });
        }
    }
}
