//! Chat relay server implementation
//!
//! This module provides the server side of the relay:
//!
//! - **Shared state**: session registry, room directory and room history
//!   behind one lock
//! - **Router**: per-line command dispatch, whisper and broadcast fan-out
//! - **Session**: identity negotiation, receive loop and guaranteed cleanup
//! - **Server**: the TCP accept loop tying them together

pub mod chat_server;
pub mod router;
pub mod session;
pub mod state;

pub use chat_server::ChatServer;
pub use router::{Flow, Router};
pub use session::Session;
pub use state::{ExitOutcome, SharedState, WhisperOutcome};
