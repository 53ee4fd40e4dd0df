//! Message routing and command dispatch
//!
//! One inbound line in, zero or more deliveries out. The router decides
//! whether a line is a control command, a whisper or a room broadcast and
//! drives the shared state accordingly. Replies to the sender go through
//! the sender's own delivery handle; a reply failing means the session is
//! already tearing down, so failures are ignored here.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::protocol::command::Command;
use crate::protocol::reply;
use crate::server::state::{DeliveryHandle, SharedState, WhisperOutcome, LOBBY};

/// What the session loop should do after a line was dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading
    Continue,
    /// The sender asked to disconnect
    Disconnect,
}

/// Per-server router over the shared state
pub struct Router {
    state: Arc<SharedState>,
    save_dir: PathBuf,
}

impl Router {
    /// Create a router over `state`; `/save` writes land in `save_dir`
    pub fn new(state: Arc<SharedState>, save_dir: PathBuf) -> Self {
        Self { state, save_dir }
    }

    /// Dispatch one inbound line from `sender`.
    ///
    /// Commands that work anywhere (`/bye`, `/list`, whisper, `/users`,
    /// `/create`, `/join`) are handled first; everything else depends on
    /// the sender's current room, and from the lobby degrades to the
    /// guidance reply.
    pub async fn dispatch(&self, sender: &str, outbound: &DeliveryHandle, line: &str) -> Flow {
        debug!(sender = %sender, line = %line, "dispatching");

        match Command::parse(line) {
            Command::Bye => {
                let _ = outbound.send(reply::GOODBYE.to_string());
                return Flow::Disconnect;
            }
            Command::ListRooms => {
                let rooms = self.state.live_rooms().await;
                let text = if rooms.is_empty() {
                    reply::NO_ROOMS.to_string()
                } else {
                    reply::room_list(&rooms)
                };
                let _ = outbound.send(text);
            }
            Command::Whisper { target, body } => match body {
                None => {
                    let _ = outbound.send(reply::WHISPER_FORMAT.to_string());
                }
                Some(body) => {
                    let text = match self.state.whisper(sender, &target, &body).await {
                        WhisperOutcome::Delivered => reply::WHISPER_SENT.to_string(),
                        WhisperOutcome::SelfTarget => reply::WHISPER_SELF.to_string(),
                        WhisperOutcome::NotFound => reply::whisper_not_found(&target),
                    };
                    let _ = outbound.send(text);
                }
            },
            Command::Users => {
                let users = self.state.identities().await;
                let _ = outbound.send(reply::user_list(&users));
            }
            Command::Create => {
                self.state.create_and_enter(sender).await;
                let _ = outbound.send(reply::room_hints());
            }
            Command::Join(arg) => match arg {
                None => {
                    let _ = outbound.send(reply::JOIN_FORMAT.to_string());
                }
                Some(room) => match self.state.join(sender, room).await {
                    Ok(()) => {
                        let _ = outbound.send(reply::room_hints());
                    }
                    Err(_) => {
                        let _ = outbound.send(reply::INVALID_ROOM.to_string());
                    }
                },
            },
            room_command => {
                if self.state.room_of(sender).await == LOBBY {
                    let _ = outbound.send(reply::LOBBY_GUIDANCE.to_string());
                    return Flow::Continue;
                }
                match room_command {
                    Command::RoomUsers => {
                        let users = self.state.room_mates(sender).await;
                        let _ = outbound.send(reply::room_user_list(&users));
                    }
                    Command::Save => {
                        let text = match self.save_history(sender).await {
                            Ok(()) => reply::SAVE_OK.to_string(),
                            Err(err) => {
                                warn!(sender = %sender, error = %err, "chat log save failed");
                                reply::SAVE_FAILED.to_string()
                            }
                        };
                        let _ = outbound.send(text);
                    }
                    Command::Exit => {
                        self.state.exit_room(sender).await;
                        let _ = outbound.send(reply::EXIT_OK.to_string());
                        let _ = outbound.send(reply::guide());
                    }
                    Command::Text(text) => {
                        self.state.broadcast_chat(sender, &text).await;
                    }
                    // handled above
                    _ => {}
                }
            }
        }

        Flow::Continue
    }

    /// Snapshot the sender's room history under the shared lock, then
    /// write it to disk outside the lock.
    async fn save_history(&self, sender: &str) -> std::io::Result<()> {
        let room = self.state.room_of(sender).await;
        let lines = self.state.history(room).await;

        let filename = format!("{}_room{}_chatlog.txt", sender, room);
        let path = self.save_dir.join(filename);
        let mut contents = lines.join("\n");
        contents.push('\n');
        tokio::fs::write(path, contents).await
    }
}
