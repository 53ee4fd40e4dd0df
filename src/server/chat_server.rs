//! TCP chat server: accept loop and session spawning
//!
//! The server binds a listener, then runs one task per accepted
//! connection. Sessions share the registry/directory/history state; a
//! failing session never propagates past its own task.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::error::Result;
use crate::server::session::Session;
use crate::server::state::SharedState;
use crate::ServerConfig;

/// Line sent to a connection rejected for capacity before it is dropped
const SERVER_FULL: &str = "Server is full. Try again later.\n";

/// Multi-room chat relay server
pub struct ChatServer {
    config: ServerConfig,
    state: Arc<SharedState>,
    listener: Option<TcpListener>,
}

impl ChatServer {
    /// Create a new server
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(SharedState::new()),
            listener: None,
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(ServerConfig::default())
    }

    /// Shared state handle (sessions, rooms, history)
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Bind the listener and return the bound address.
    ///
    /// Useful before `run` when the configured port is 0 and the caller
    /// needs the actual one.
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let addr = listener.local_addr()?;
        info!(addr = %addr, "listening");
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Accept connections forever, one session task per connection
    pub async fn run(&mut self) -> Result<()> {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => {
                let listener = TcpListener::bind(self.config.bind_addr).await?;
                info!(addr = %listener.local_addr()?, "listening");
                listener
            }
        };

        loop {
            let (stream, peer) = listener.accept().await?;

            if self.state.session_count().await >= self.config.max_connections {
                warn!(peer = %peer, "connection limit reached, rejecting");
                reject(stream).await;
                continue;
            }

            let session = Session::new(peer, self.state(), self.config.clone());
            tokio::spawn(async move {
                session.run(stream).await;
            });
        }
    }
}

/// Tell an over-capacity peer why before hanging up on it
async fn reject(mut stream: TcpStream) {
    let _ = stream.write_all(SERVER_FULL.as_bytes()).await;
    let _ = stream.shutdown().await;
}
