//! Shared session and room state
//!
//! This module is the authority on who is connected, which room each
//! identity occupies, and what was said in each room. The three maps are
//! guarded by a single lock: registration, room changes and broadcast
//! fan-out are multi-map sequences, and the invariant that matters is
//! cross-map (an identity is registered iff it has a room entry), so
//! per-map locks would not help.
//!
//! Delivery handles are unbounded channels drained by a per-session writer
//! task. A send under the lock therefore never waits on socket I/O; a slow
//! peer only grows its own queue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};

use crate::error::{ChatError, Result};
use crate::protocol::reply;

/// The lobby: every identity starts here and returns here on `/exit`
pub const LOBBY: u64 = 0;

/// Outbound delivery handle for one session
pub type DeliveryHandle = mpsc::UnboundedSender<String>;

/// Result of a whisper attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhisperOutcome {
    /// Delivered to the target's handle
    Delivered,
    /// Sender targeted themself
    SelfTarget,
    /// Target is not registered (or its handle is dead)
    NotFound,
}

/// Result of leaving a room
#[derive(Debug, Clone, Copy)]
pub struct ExitOutcome {
    /// The room that was vacated
    pub room: u64,
    /// True when nobody remained in the vacated room
    pub now_empty: bool,
}

/// The maps every session shares, all mutated under one lock
#[derive(Default)]
struct Inner {
    /// identity -> outbound delivery handle
    clients: HashMap<String, DeliveryHandle>,
    /// identity -> current room (LOBBY = no room)
    rooms: HashMap<String, u64>,
    /// room -> ordered chat log, append-only
    logs: HashMap<u64, Vec<String>>,
}

impl Inner {
    /// Deliver a line to every identity currently in `room`.
    ///
    /// A dead handle must not abort the fan-out: the failed identity is
    /// purged from both maps and delivery continues to the rest.
    fn deliver_to_room(&mut self, room: u64, line: &str) {
        let mut dead = Vec::new();
        for (identity, handle) in &self.clients {
            if self.rooms.get(identity).copied() == Some(room)
                && handle.send(line.to_string()).is_err()
            {
                dead.push(identity.clone());
            }
        }
        for identity in dead {
            warn!(identity = %identity, "dropping unreachable recipient");
            self.clients.remove(&identity);
            self.rooms.remove(&identity);
        }
    }

    /// Identities whose current room equals `room`, sorted for stable output
    fn occupants_of(&self, room: u64) -> Vec<String> {
        let mut users: Vec<String> = self
            .rooms
            .iter()
            .filter(|(_, r)| **r == room)
            .map(|(identity, _)| identity.clone())
            .collect();
        users.sort_unstable();
        users
    }
}

/// Shared state for the whole relay: session registry, room directory and
/// room history store behind one lock, plus the room number allocator.
pub struct SharedState {
    inner: Mutex<Inner>,
    /// Monotonic room numbers, never reused even after a room empties
    next_room: AtomicU64,
}

impl SharedState {
    /// Create empty shared state; room numbers start at 1
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            next_room: AtomicU64::new(1),
        }
    }

    /// Allocate the next room number. Atomic, never blocks, never reused.
    fn allocate_room(&self) -> u64 {
        self.next_room.fetch_add(1, Ordering::Relaxed)
    }

    /// Register an identity and its delivery handle.
    ///
    /// Atomic check-and-insert: of concurrent callers with the same
    /// identity, at most one succeeds. The directory entry is seeded to the
    /// lobby in the same critical section so there is no window where an
    /// identity is registered but roomless.
    pub async fn register(&self, identity: &str, handle: DeliveryHandle) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.clients.contains_key(identity) {
            return Err(ChatError::identity_taken(identity));
        }
        inner.clients.insert(identity.to_string(), handle);
        inner.rooms.insert(identity.to_string(), LOBBY);
        Ok(())
    }

    /// Remove an identity from the registry and directory. Idempotent.
    pub async fn deregister(&self, identity: &str) {
        let mut inner = self.inner.lock().await;
        inner.clients.remove(identity);
        inner.rooms.remove(identity);
    }

    /// Number of currently registered sessions
    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.clients.len()
    }

    /// Point-in-time list of connected identities, sorted
    pub async fn identities(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut users: Vec<String> = inner.clients.keys().cloned().collect();
        users.sort_unstable();
        users
    }

    /// Current room of an identity (LOBBY when unknown)
    pub async fn room_of(&self, identity: &str) -> u64 {
        let inner = self.inner.lock().await;
        inner.rooms.get(identity).copied().unwrap_or(LOBBY)
    }

    /// Live room numbers (a room is live iff someone is in it), sorted
    pub async fn live_rooms(&self) -> Vec<u64> {
        let inner = self.inner.lock().await;
        let mut rooms: Vec<u64> = inner
            .rooms
            .values()
            .copied()
            .filter(|room| *room != LOBBY)
            .collect();
        rooms.sort_unstable();
        rooms.dedup();
        rooms
    }

    /// Occupants of an identity's current room, sorted
    pub async fn room_mates(&self, identity: &str) -> Vec<String> {
        let inner = self.inner.lock().await;
        let room = inner.rooms.get(identity).copied().unwrap_or(LOBBY);
        inner.occupants_of(room)
    }

    /// Allocate a fresh room, move the sender into it and broadcast the
    /// entry notice (which only the sender can receive, the room being
    /// brand new). Assignment and notice share one critical section.
    pub async fn create_and_enter(&self, identity: &str) -> u64 {
        let room = self.allocate_room();
        let mut inner = self.inner.lock().await;
        inner.rooms.insert(identity.to_string(), room);
        inner.deliver_to_room(room, &reply::entry_notice(identity));
        info!(room, "room created");
        room
    }

    /// Move the sender into a live room and broadcast the entry notice.
    ///
    /// Fails when `room` is the lobby or nobody occupies it. Validation,
    /// assignment and notice share one critical section so a concurrent
    /// exit cannot make the notice lie about membership.
    pub async fn join(&self, identity: &str, room: u64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if room == LOBBY || !inner.rooms.values().any(|r| *r == room) {
            return Err(ChatError::invalid_room(format!("room {}", room)));
        }
        inner.rooms.insert(identity.to_string(), room);
        inner.deliver_to_room(room, &reply::entry_notice(identity));
        Ok(())
    }

    /// Return the sender to the lobby, notifying the remaining occupants.
    ///
    /// The vacated room number is never reused; when the room went empty
    /// that is logged and no notice is sent.
    pub async fn exit_room(&self, identity: &str) -> ExitOutcome {
        let mut inner = self.inner.lock().await;
        let room = inner.rooms.get(identity).copied().unwrap_or(LOBBY);
        inner.rooms.insert(identity.to_string(), LOBBY);
        let now_empty = !inner.rooms.values().any(|r| *r == room);
        if now_empty {
            info!(room, "room is now empty");
        } else {
            inner.deliver_to_room(room, &reply::exit_notice(identity));
        }
        ExitOutcome { room, now_empty }
    }

    /// Broadcast a chat line to the sender's room (sender included) and
    /// append it to that room's history, both under one lock acquisition
    /// so `/save` never observes a torn log.
    pub async fn broadcast_chat(&self, identity: &str, text: &str) {
        let mut inner = self.inner.lock().await;
        let room = inner.rooms.get(identity).copied().unwrap_or(LOBBY);
        let line = reply::chat(identity, text);
        inner.deliver_to_room(room, &line);
        inner.logs.entry(room).or_default().push(line);
    }

    /// Deliver a whisper. Touches exactly two entries, nothing is iterated.
    pub async fn whisper(&self, sender: &str, target: &str, body: &str) -> WhisperOutcome {
        let mut inner = self.inner.lock().await;
        if sender == target {
            return WhisperOutcome::SelfTarget;
        }
        let delivered = match inner.clients.get(target) {
            Some(handle) => handle.send(reply::whisper(sender, body)).is_ok(),
            None => return WhisperOutcome::NotFound,
        };
        if delivered {
            WhisperOutcome::Delivered
        } else {
            warn!(identity = %target, "dropping unreachable whisper target");
            inner.clients.remove(target);
            inner.rooms.remove(target);
            WhisperOutcome::NotFound
        }
    }

    /// Ordered history of a room (empty when nothing was recorded)
    pub async fn history(&self, room: u64) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.logs.get(&room).cloned().unwrap_or_default()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
