//! Session lifecycle: identity negotiation, receive loop, cleanup
//!
//! One session owns one connection end to end. It negotiates a unique
//! identity, then feeds each inbound line to the router until the peer
//! hangs up, a read fails, or the router signals `/bye`. Whatever the exit
//! path, cleanup runs exactly once: the session deregisters its identity
//! and closes its writer, all through a single exit point after the loops.
//!
//! Outbound delivery is decoupled from the shared lock: every session has
//! an unbounded mailbox drained into the socket by a writer task, so other
//! sessions' fan-outs only ever enqueue.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, warn};

use crate::protocol::reply;
use crate::server::router::{Flow, Router};
use crate::server::state::{DeliveryHandle, SharedState};
use crate::ServerConfig;

type LineSink = SplitSink<Framed<TcpStream, LinesCodec>, String>;
type LineStream = SplitStream<Framed<TcpStream, LinesCodec>>;

/// Per-connection session handler
pub struct Session {
    /// Connection id for logs (identities are not unique until negotiated)
    conn_id: String,
    peer: SocketAddr,
    state: Arc<SharedState>,
    router: Router,
    config: ServerConfig,
}

impl Session {
    /// Create a session for one accepted connection
    pub fn new(peer: SocketAddr, state: Arc<SharedState>, config: ServerConfig) -> Self {
        let router = Router::new(Arc::clone(&state), config.save_dir.clone());
        Self {
            conn_id: uuid::Uuid::new_v4().to_string(),
            peer,
            state,
            router,
            config,
        }
    }

    /// Drive the session to completion.
    /// This is the main entry point that should be spawned as a task.
    pub async fn run(self, stream: TcpStream) {
        debug!(conn_id = %self.conn_id, peer = %self.peer, "session starting");

        let framed = Framed::new(
            stream,
            LinesCodec::new_with_max_length(self.config.max_line_len),
        );
        let (sink, mut lines) = framed.split();

        // The session's mailbox: fan-outs from any session enqueue here,
        // the writer task drains into the socket.
        let (outbound, mailbox) = mpsc::unbounded_channel();
        let writer = spawn_writer(sink, mailbox);

        let identity = match self.negotiate(&mut lines, &outbound).await {
            Some(identity) => identity,
            None => {
                // Peer left before claiming a name; nothing was registered.
                debug!(conn_id = %self.conn_id, peer = %self.peer, "left during negotiation");
                drop(outbound);
                let _ = writer.await;
                return;
            }
        };

        info!(conn_id = %self.conn_id, peer = %self.peer, identity = %identity, "connected");
        let _ = outbound.send(reply::guide());

        self.receive_loop(&mut lines, &outbound, &identity).await;

        // Guaranteed cleanup, reached from every exit of the loop above:
        // /bye, peer hang-up and read errors all land here exactly once.
        self.state.deregister(&identity).await;
        drop(outbound);
        let _ = writer.await;
        info!(conn_id = %self.conn_id, identity = %identity, "disconnected");
    }

    /// Identity negotiation: loop until an acceptable candidate registers.
    ///
    /// Blank or whitespace-only candidates are re-prompted locally; taken
    /// names are re-prompted after the registry (the uniqueness arbiter)
    /// rejects them. Returns `None` when the stream ends first.
    async fn negotiate(
        &self,
        lines: &mut LineStream,
        outbound: &DeliveryHandle,
    ) -> Option<String> {
        loop {
            let candidate = match lines.next().await? {
                Ok(line) => line,
                Err(err) => {
                    warn!(conn_id = %self.conn_id, error = %err, "read failed during negotiation");
                    return None;
                }
            };

            let candidate = candidate.trim();
            if candidate.is_empty() {
                let _ = outbound.send(reply::IDENTITY_BLANK.to_string());
                continue;
            }

            match self.state.register(candidate, outbound.clone()).await {
                Ok(()) => return Some(candidate.to_string()),
                Err(_) => {
                    let _ = outbound.send(reply::IDENTITY_TAKEN.to_string());
                }
            }
        }
    }

    /// Read one line at a time and hand each to the router
    async fn receive_loop(
        &self,
        lines: &mut LineStream,
        outbound: &DeliveryHandle,
        identity: &str,
    ) {
        while let Some(item) = lines.next().await {
            let line = match item {
                Ok(line) => line,
                Err(err) => {
                    warn!(conn_id = %self.conn_id, identity = %identity, error = %err, "read failed");
                    return;
                }
            };

            if self.router.dispatch(identity, outbound, &line).await == Flow::Disconnect {
                return;
            }
        }
    }
}

/// Drain a session's mailbox into its socket. Exits when the mailbox
/// closes (session cleanup) or the peer stops accepting writes.
fn spawn_writer(
    mut sink: LineSink,
    mut mailbox: mpsc::UnboundedReceiver<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = mailbox.recv().await {
            if sink.send(line).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    })
}
