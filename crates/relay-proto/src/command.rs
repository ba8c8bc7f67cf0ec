//! Inbound (client → server) line classification.
//!
//! Lines are classified in a fixed priority order: `STATUS::`, `FILE::`,
//! `DM::`, then plain chat. Blank lines are recognised before anything
//! else so the caller can drop them.

use crate::DELIMITER;

/// Prefix of a status update command.
pub const STATUS_PREFIX: &str = "STATUS::";
/// Prefix of a file relay command.
pub const FILE_PREFIX: &str = "FILE::";
/// Prefix of a direct message command.
pub const DM_PREFIX: &str = "DM::";

/// A classified client line, borrowing from the raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientLine<'a> {
    /// `STATUS::<status>`; the status is already trimmed.
    Status(&'a str),
    /// `FILE::<filename>::<payload>`.
    ///
    /// `body` is everything after the prefix and is relayed untouched. The
    /// accessors split it for logging only.
    File {
        /// Raw `filename::payload` remainder.
        body: &'a str,
    },
    /// `DM::<recipient>::<text>`, split on the first delimiter.
    Direct {
        /// Target username.
        recipient: &'a str,
        /// Message body, may itself contain `::`.
        text: &'a str,
    },
    /// A `DM::` line without a second delimiter.
    Malformed(&'a str),
    /// Anything else that is not blank.
    Chat(&'a str),
    /// Empty or whitespace-only line.
    Blank,
}

impl<'a> ClientLine<'a> {
    /// Classify a single line (terminator already stripped).
    pub fn parse(line: &'a str) -> Self {
        if line.trim().is_empty() {
            return ClientLine::Blank;
        }

        if let Some(status) = line.strip_prefix(STATUS_PREFIX) {
            return ClientLine::Status(status.trim());
        }

        if let Some(body) = line.strip_prefix(FILE_PREFIX) {
            return ClientLine::File { body };
        }

        if let Some(rest) = line.strip_prefix(DM_PREFIX) {
            return match rest.split_once(DELIMITER) {
                Some((recipient, text)) => ClientLine::Direct { recipient, text },
                None => ClientLine::Malformed(line),
            };
        }

        ClientLine::Chat(line)
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientLine::Status(_) => "status",
            ClientLine::File { .. } => "file",
            ClientLine::Direct { .. } => "dm",
            ClientLine::Malformed(_) => "malformed",
            ClientLine::Chat(_) => "chat",
            ClientLine::Blank => "blank",
        }
    }
}

/// Split a `FILE::` body into `(filename, payload)`.
///
/// Returns `None` when no delimiter is present. The server never needs this;
/// it exists for clients and diagnostics.
pub fn split_file_body(body: &str) -> Option<(&str, &str)> {
    body.split_once(DELIMITER)
}

/// Build a `STATUS::` line.
pub fn status_line(status: &str) -> String {
    format!("{STATUS_PREFIX}{status}")
}

/// Build a `FILE::` line from a filename and an already-encoded payload.
pub fn file_line(filename: &str, payload: &str) -> String {
    format!("{FILE_PREFIX}{filename}{DELIMITER}{payload}")
}

/// Build a `DM::` line.
pub fn dm_line(recipient: &str, text: &str) -> String {
    format!("{DM_PREFIX}{recipient}{DELIMITER}{text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_trimmed() {
        assert_eq!(ClientLine::parse("STATUS::  Away "), ClientLine::Status("Away"));
        assert_eq!(ClientLine::parse("STATUS::"), ClientLine::Status(""));
    }

    #[test]
    fn test_file_body_is_untouched() {
        let line = "FILE::report.txt::SGVsbG8=";
        assert_eq!(
            ClientLine::parse(line),
            ClientLine::File {
                body: "report.txt::SGVsbG8="
            }
        );
        assert_eq!(
            split_file_body("report.txt::SGVsbG8="),
            Some(("report.txt", "SGVsbG8="))
        );
        assert_eq!(split_file_body("no-delimiter"), None);
    }

    #[test]
    fn test_dm_splits_on_first_delimiter() {
        assert_eq!(
            ClientLine::parse("DM::bob::a::b"),
            ClientLine::Direct {
                recipient: "bob",
                text: "a::b"
            }
        );
        assert_eq!(
            ClientLine::parse("DM::bob"),
            ClientLine::Malformed("DM::bob")
        );
    }

    #[test]
    fn test_priority_order() {
        // STATUS wins over anything embedded later in the line.
        assert_eq!(
            ClientLine::parse("STATUS::DM::bob::hi"),
            ClientLine::Status("DM::bob::hi")
        );
        // Prefixes are case sensitive; lowercase falls through to chat.
        assert_eq!(ClientLine::parse("dm::bob::hi"), ClientLine::Chat("dm::bob::hi"));
    }

    #[test]
    fn test_blank_and_chat() {
        assert_eq!(ClientLine::parse(""), ClientLine::Blank);
        assert_eq!(ClientLine::parse(" \t "), ClientLine::Blank);
        assert_eq!(ClientLine::parse("  hi  "), ClientLine::Chat("  hi  "));
    }

    #[test]
    fn test_builders_roundtrip_through_parse() {
        assert_eq!(ClientLine::parse(&status_line("Busy")), ClientLine::Status("Busy"));
        assert_eq!(
            ClientLine::parse(&dm_line("carol", "yo")),
            ClientLine::Direct {
                recipient: "carol",
                text: "yo"
            }
        );
        assert_eq!(file_line("a.bin", "AAEC"), "FILE::a.bin::AAEC");
    }
}
