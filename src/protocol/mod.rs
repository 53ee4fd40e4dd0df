//! Line protocol for the chat relay
//!
//! This module provides:
//! - Inbound line classification (`Command`)
//! - Outbound reply and notice text builders

pub mod command;
pub mod reply;

// Re-export commonly used types
pub use command::Command;
