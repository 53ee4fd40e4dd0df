//! Error handling for the chat relay

use std::fmt;

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// Chat relay error types
#[derive(Debug, Clone)]
pub enum ChatError {
    /// Chosen identity is already registered by a live session
    IdentityTaken(String),
    /// Chosen identity is blank or whitespace-only
    InvalidIdentity(String),
    /// Command line could not be parsed (bad `/join` argument, bodiless whisper)
    MalformedCommand(String),
    /// `/join` referenced a room that is not live (or room 0)
    InvalidRoom(String),
    /// Delivery to a recipient's outbound handle failed
    RecipientUnreachable(String),
    /// The owning session's connection closed or failed
    Transport(String),
    /// `/save` could not write the chat log
    Persistence(String),
}

impl ChatError {
    /// Create an identity-taken error
    pub fn identity_taken<T: Into<String>>(msg: T) -> Self {
        ChatError::IdentityTaken(msg.into())
    }

    /// Create an invalid-identity error
    pub fn invalid_identity<T: Into<String>>(msg: T) -> Self {
        ChatError::InvalidIdentity(msg.into())
    }

    /// Create a malformed-command error
    pub fn malformed_command<T: Into<String>>(msg: T) -> Self {
        ChatError::MalformedCommand(msg.into())
    }

    /// Create an invalid-room error
    pub fn invalid_room<T: Into<String>>(msg: T) -> Self {
        ChatError::InvalidRoom(msg.into())
    }

    /// Create a recipient-unreachable error
    pub fn recipient_unreachable<T: Into<String>>(msg: T) -> Self {
        ChatError::RecipientUnreachable(msg.into())
    }

    /// Create a transport error
    pub fn transport<T: Into<String>>(msg: T) -> Self {
        ChatError::Transport(msg.into())
    }

    /// Create a persistence error
    pub fn persistence<T: Into<String>>(msg: T) -> Self {
        ChatError::Persistence(msg.into())
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::IdentityTaken(msg) => write!(f, "Identity taken: {}", msg),
            ChatError::InvalidIdentity(msg) => write!(f, "Invalid identity: {}", msg),
            ChatError::MalformedCommand(msg) => write!(f, "Malformed command: {}", msg),
            ChatError::InvalidRoom(msg) => write!(f, "Invalid room: {}", msg),
            ChatError::RecipientUnreachable(msg) => write!(f, "Recipient unreachable: {}", msg),
            ChatError::Transport(msg) => write!(f, "Transport error: {}", msg),
            ChatError::Persistence(msg) => write!(f, "Persistence error: {}", msg),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        ChatError::Transport(format!("IO error: {}", err))
    }
}

impl From<tokio_util::codec::LinesCodecError> for ChatError {
    fn from(err: tokio_util::codec::LinesCodecError) -> Self {
        ChatError::Transport(format!("Line codec error: {}", err))
    }
}

impl From<tokio::sync::mpsc::error::SendError<String>> for ChatError {
    fn from(err: tokio::sync::mpsc::error::SendError<String>) -> Self {
        ChatError::RecipientUnreachable(format!("Outbound channel closed: {}", err))
    }
}
