//! Line-based multi-room chat relay
//!
//! This library provides a TCP chat server where clients claim a unique
//! display name, then talk in numbered rooms: broadcast to a room, whisper
//! to a single user, or drive the session with slash commands (`/list`,
//! `/users`, `/create`, `/join`, `/roomusers`, `/save`, `/exit`, `/bye`).
//!
//! The server is the sole arbiter of name uniqueness, room membership and
//! fan-out ordering. All shared state lives behind one lock so that
//! registration, room changes and broadcast fan-out observe a consistent
//! view under concurrent sessions.

pub mod error;
pub mod protocol;
pub mod server;

pub use error::{ChatError, Result};
pub use server::ChatServer;

use std::net::SocketAddr;
use std::path::PathBuf;

/// Chat server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
    /// Maximum number of concurrent sessions
    pub max_connections: usize,
    /// Maximum accepted line length in bytes
    pub max_line_len: usize,
    /// Directory that `/save` writes chat logs into
    pub save_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:12345".parse().unwrap(),
            max_connections: 1000,
            max_line_len: 8 * 1024,
            save_dir: PathBuf::from("."),
        }
    }
}
