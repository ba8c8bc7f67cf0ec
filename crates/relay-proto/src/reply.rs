//! Outbound (server → client) lines.
//!
//! [`ServerLine`] renders the exact wire text through `Display`. Clients use
//! its `FromStr` impl to classify what they receive.

use std::fmt;
use std::str::FromStr;

use crate::DELIMITER;
use crate::error::ProtocolError;
use crate::presence::{PRESENCE_PREFIX, Presence};

const PROMPT: &str = "Enter your username:";
const USERNAME_TAKEN: &str = "Username already taken. Please try again.";
const USER_EVENT_PREFIX: &str = "USER_EVENT::";
const FILE_FROM_PREFIX: &str = "FILE_FROM::";
const PRIVATE_PREFIX: &str = "PRIVATE::";
const NOT_FOUND_PREFIX: &str = "System: User '";
const NOT_FOUND_SUFFIX: &str = "' not found or offline.";
const SENDER_SEPARATOR: &str = ": ";

/// Presence change announced with `USER_EVENT::`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    /// A session became Active.
    Joined,
    /// An Active session closed.
    Left,
}

impl PresenceEvent {
    /// Wire token for this event.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceEvent::Joined => "joined",
            PresenceEvent::Left => "left",
        }
    }
}

impl fmt::Display for PresenceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every line the server can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Handshake prompt, sent once on connect.
    Prompt,
    /// Claim rejected; the connection closes afterwards.
    UsernameTaken,
    /// Full presence snapshot.
    Presence(Presence),
    /// Join or leave announcement.
    UserEvent {
        /// What happened.
        event: PresenceEvent,
        /// Who it happened to.
        name: String,
    },
    /// Relayed file. `body` is the sender's `filename::payload`, untouched.
    FileFrom {
        /// Originating username.
        from: String,
        /// `filename::payload` exactly as the sender wrote it.
        body: String,
    },
    /// Delivered private message.
    Private {
        /// Originating username.
        from: String,
        /// Message body.
        text: String,
    },
    /// DM recipient was not online.
    NotFound {
        /// The name the sender asked for.
        name: String,
    },
    /// Broadcast chat relay.
    Chat {
        /// Originating username.
        from: String,
        /// Message body.
        text: String,
    },
    /// A line with no recognised shape (clients only).
    Notice(String),
}

impl ServerLine {
    /// Split a [`ServerLine::FileFrom`] body into `(filename, payload)`.
    pub fn file_parts(&self) -> Option<(&str, &str)> {
        match self {
            ServerLine::FileFrom { body, .. } => body.split_once(DELIMITER),
            _ => None,
        }
    }
}

impl fmt::Display for ServerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerLine::Prompt => f.write_str(PROMPT),
            ServerLine::UsernameTaken => f.write_str(USERNAME_TAKEN),
            ServerLine::Presence(presence) => write!(f, "{presence}"),
            ServerLine::UserEvent { event, name } => {
                write!(f, "{USER_EVENT_PREFIX}{event}{DELIMITER}{name}")
            }
            ServerLine::FileFrom { from, body } => {
                write!(f, "{FILE_FROM_PREFIX}{from}{DELIMITER}{body}")
            }
            ServerLine::Private { from, text } => {
                write!(f, "{PRIVATE_PREFIX}{from}{SENDER_SEPARATOR}{text}")
            }
            ServerLine::NotFound { name } => {
                write!(f, "{NOT_FOUND_PREFIX}{name}{NOT_FOUND_SUFFIX}")
            }
            ServerLine::Chat { from, text } => write!(f, "{from}{SENDER_SEPARATOR}{text}"),
            ServerLine::Notice(text) => f.write_str(text),
        }
    }
}

/// Split `sender: text` on the first separator. A separator at index 0
/// means there is no sender.
fn split_sender(s: &str) -> Option<(&str, &str)> {
    match s.find(SENDER_SEPARATOR) {
        Some(idx) if idx > 0 => Some((&s[..idx], &s[idx + SENDER_SEPARATOR.len()..])),
        _ => None,
    }
}

impl FromStr for ServerLine {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        if line == PROMPT {
            return Ok(ServerLine::Prompt);
        }
        if line == USERNAME_TAKEN {
            return Ok(ServerLine::UsernameTaken);
        }
        if let Some(list) = line.strip_prefix(PRESENCE_PREFIX.trim_end()) {
            return Ok(ServerLine::Presence(Presence::parse_list(list)));
        }
        if let Some(rest) = line.strip_prefix(USER_EVENT_PREFIX) {
            let (event, name) = rest
                .split_once(DELIMITER)
                .ok_or_else(|| ProtocolError::malformed("USER_EVENT", line))?;
            let event = match event {
                "joined" => PresenceEvent::Joined,
                "left" => PresenceEvent::Left,
                _ => return Err(ProtocolError::malformed("USER_EVENT", line)),
            };
            return Ok(ServerLine::UserEvent {
                event,
                name: name.to_string(),
            });
        }
        if let Some(rest) = line.strip_prefix(FILE_FROM_PREFIX) {
            let (from, body) = rest
                .split_once(DELIMITER)
                .ok_or_else(|| ProtocolError::malformed("FILE_FROM", line))?;
            return Ok(ServerLine::FileFrom {
                from: from.to_string(),
                body: body.to_string(),
            });
        }
        if let Some(rest) = line.strip_prefix(PRIVATE_PREFIX) {
            let (from, text) =
                split_sender(rest).ok_or_else(|| ProtocolError::malformed("PRIVATE", line))?;
            return Ok(ServerLine::Private {
                from: from.to_string(),
                text: text.to_string(),
            });
        }
        if let Some(name) = line
            .strip_prefix(NOT_FOUND_PREFIX)
            .and_then(|rest| rest.strip_suffix(NOT_FOUND_SUFFIX))
        {
            return Ok(ServerLine::NotFound {
                name: name.to_string(),
            });
        }
        if let Some((from, text)) = split_sender(line) {
            return Ok(ServerLine::Chat {
                from: from.to_string(),
                text: text.to_string(),
            });
        }
        Ok(ServerLine::Notice(line.to_string()))
    }
}
