//! Inbound line classification
//!
//! Every line a session reads is classified into exactly one [`Command`].
//! The match order below is the observable protocol contract: `/bye`,
//! `/list`, whisper, `/users`, `/create` and `/join` win over everything
//! else, and several prefixes would otherwise overlap. Room-dependent rules
//! (lobby guidance, room-only commands) are applied by the router, which
//! knows the sender's current room.

/// A classified inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/bye` — disconnect
    Bye,
    /// `/list` — list live rooms
    ListRooms,
    /// `@<id> <body>` — whisper; `body` is `None` when the space/body is missing
    Whisper {
        /// Target identity (text between `@` and the first space)
        target: String,
        /// Message body after the first space
        body: Option<String>,
    },
    /// `/users` — list connected identities
    Users,
    /// `/create` — allocate a new room and enter it
    Create,
    /// `/join <n>` — enter room `n`; `None` when the argument is missing or non-numeric
    Join(Option<u64>),
    /// `/roomusers` — list occupants of the sender's room
    RoomUsers,
    /// `/save` — persist the sender's room history
    Save,
    /// `/exit` — return to the lobby
    Exit,
    /// Anything else — a chat message
    Text(String),
}

impl Command {
    /// Classify one inbound line.
    ///
    /// Keyword matching is ASCII case-insensitive. Malformed whispers and
    /// `/join` arguments never fail here; they carry their defect so the
    /// router can answer with a corrective reply.
    pub fn parse(line: &str) -> Command {
        if line.eq_ignore_ascii_case("/bye") {
            Command::Bye
        } else if line.eq_ignore_ascii_case("/list") {
            Command::ListRooms
        } else if let Some(rest) = line.strip_prefix('@') {
            match rest.split_once(' ') {
                Some((target, body)) => Command::Whisper {
                    target: target.to_string(),
                    body: Some(body.to_string()),
                },
                None => Command::Whisper {
                    target: rest.to_string(),
                    body: None,
                },
            }
        } else if line.eq_ignore_ascii_case("/users") {
            Command::Users
        } else if line.eq_ignore_ascii_case("/create") {
            Command::Create
        } else if line.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("/join")) {
            let arg = line
                .split_once(' ')
                .and_then(|(_, rest)| rest.trim().parse::<u64>().ok());
            Command::Join(arg)
        } else if line.eq_ignore_ascii_case("/roomusers") {
            Command::RoomUsers
        } else if line.eq_ignore_ascii_case("/save") {
            Command::Save
        } else if line.eq_ignore_ascii_case("/exit") {
            Command::Exit
        } else {
            Command::Text(line.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_commands_case_insensitive() {
        assert_eq!(Command::parse("/bye"), Command::Bye);
        assert_eq!(Command::parse("/BYE"), Command::Bye);
        assert_eq!(Command::parse("/List"), Command::ListRooms);
        assert_eq!(Command::parse("/USERS"), Command::Users);
        assert_eq!(Command::parse("/Create"), Command::Create);
        assert_eq!(Command::parse("/RoomUsers"), Command::RoomUsers);
        assert_eq!(Command::parse("/SAVE"), Command::Save);
        assert_eq!(Command::parse("/Exit"), Command::Exit);
    }

    #[test]
    fn test_whisper_parse() {
        assert_eq!(
            Command::parse("@bob hi there"),
            Command::Whisper {
                target: "bob".to_string(),
                body: Some("hi there".to_string()),
            }
        );
    }

    #[test]
    fn test_whisper_without_body_is_not_a_crash() {
        assert_eq!(
            Command::parse("@bob"),
            Command::Whisper {
                target: "bob".to_string(),
                body: None,
            }
        );
        assert_eq!(
            Command::parse("@"),
            Command::Whisper {
                target: String::new(),
                body: None,
            }
        );
    }

    #[test]
    fn test_join_arguments() {
        assert_eq!(Command::parse("/join 3"), Command::Join(Some(3)));
        assert_eq!(Command::parse("/JOIN 12"), Command::Join(Some(12)));
        assert_eq!(Command::parse("/join abc"), Command::Join(None));
        assert_eq!(Command::parse("/join"), Command::Join(None));
    }

    #[test]
    fn test_plain_text_falls_through() {
        assert_eq!(
            Command::parse("hello world"),
            Command::Text("hello world".to_string())
        );
        // A slash command nobody knows is just chat
        assert_eq!(
            Command::parse("/dance"),
            Command::Text("/dance".to_string())
        );
    }

    #[test]
    fn test_priority_over_overlapping_prefixes() {
        // "/listings" is not "/list"
        assert_eq!(
            Command::parse("/listings"),
            Command::Text("/listings".to_string())
        );
        // but any "/join..." prefix is a join attempt
        assert_eq!(Command::parse("/joinx"), Command::Join(None));
    }
}
