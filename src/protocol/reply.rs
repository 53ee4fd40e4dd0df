//! Outbound reply and notice text
//!
//! Every user-visible line the server emits is built here, so the router
//! and session code never format protocol text inline and tests have one
//! place to anchor their assertions.

/// Rejection for an identity that is already registered
pub const IDENTITY_TAKEN: &str = "That name is already taken. Please choose another.";

/// Rejection for a blank or whitespace-only identity
pub const IDENTITY_BLANK: &str = "A name cannot be blank. Please choose another.";

/// Farewell sent before the server closes the session on `/bye`
pub const GOODBYE: &str = "Goodbye.";

/// Reply to `/list` when no room is live
pub const NO_ROOMS: &str = "No rooms yet. Use /create to make one.";

/// Rejection for whispering to yourself
pub const WHISPER_SELF: &str = "You cannot whisper to yourself.";

/// Confirmation to the whisper sender
pub const WHISPER_SENT: &str = "Whisper sent.";

/// Corrective reply for a whisper with no message body
pub const WHISPER_FORMAT: &str = "Whisper format: @<id> <message>";

/// Corrective reply for a non-numeric `/join` argument
pub const JOIN_FORMAT: &str = "Room numbers are numeric. Usage: /join <room>";

/// Rejection for `/join` to a room that is not live
pub const INVALID_ROOM: &str = "No such room. Use /list to see live rooms.";

/// Nudge shown when a lobby session sends something only rooms support
pub const LOBBY_GUIDANCE: &str =
    "Join a room first. /create makes a room, /join <room> enters one.";

/// Confirmation for a successful `/save`
pub const SAVE_OK: &str = "Chat log saved.";

/// Report for a `/save` whose write failed
pub const SAVE_FAILED: &str = "Could not save the chat log.";

/// Confirmation for `/exit`
pub const EXIT_OK: &str = "You left the room.";

/// Command guide, sent after negotiation and whenever a session returns to the lobby
pub fn guide() -> String {
    [
        "List rooms : /list",
        "Connected users : /users",
        "Whisper : @<id> <message>",
        "Create a room : /create",
        "Join a room : /join <room>",
        "Leave the room : /exit",
        "Disconnect : /bye",
    ]
    .join("\n")
}

/// In-room hints, shown to a user right after they enter a room
pub fn room_hints() -> String {
    ["Users in this room : /roomusers", "Save the chat log : /save"].join("\n")
}

/// Reply to `/list`
pub fn room_list(rooms: &[u64]) -> String {
    let list: Vec<String> = rooms.iter().map(u64::to_string).collect();
    format!("Rooms: {}", list.join(" "))
}

/// Reply to `/users`
pub fn user_list(users: &[String]) -> String {
    format!("Connected users: {}", users.join(" "))
}

/// Reply to `/roomusers`
pub fn room_user_list(users: &[String]) -> String {
    format!("In this room: {}", users.join(" "))
}

/// Whisper line as seen by the recipient
pub fn whisper(sender: &str, body: &str) -> String {
    format!("{}'s whisper: {}", sender, body)
}

/// Reply when a whisper target is not connected
pub fn whisper_not_found(target: &str) -> String {
    format!("{} is not connected.", target)
}

/// Broadcast chat line, also the form recorded in room history
pub fn chat(sender: &str, text: &str) -> String {
    format!("{}: {}", sender, text)
}

/// Entry notice broadcast to a room
pub fn entry_notice(identity: &str) -> String {
    format!("{} has joined the room.", identity)
}

/// Exit notice broadcast to the remaining occupants
pub fn exit_notice(identity: &str) -> String {
    format!("{} has left the room.", identity)
}
