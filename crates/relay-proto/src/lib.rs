//! # relay-proto
//!
//! The line protocol spoken between `relayd` and its clients.
//!
//! Every message is one UTF-8 line terminated by `\n`. Clients send plain
//! chat text or one of the `STATUS::`, `FILE::` and `DM::` commands; the
//! server answers with the forms modelled by [`ServerLine`].
//!
//! ## Features
//!
//! - [`ClientLine`] classifies inbound lines in command priority order
//! - [`ServerLine`] renders (and, for clients, parses) every server line
//! - [`Presence`] formats the `Online users:` snapshot
//! - [`LineCodec`] frames lines for `tokio_util::codec` transports
//!
//! ## Quick Start
//!
//! ```rust
//! use relay_proto::{ClientLine, ServerLine};
//!
//! let line = ClientLine::parse("DM::bob::see you at 5");
//! assert_eq!(
//!     line,
//!     ClientLine::Direct { recipient: "bob", text: "see you at 5" }
//! );
//!
//! let out = ServerLine::Private { from: "alice".into(), text: "see you at 5".into() };
//! assert_eq!(out.to_string(), "PRIVATE::alice: see you at 5");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod presence;
pub mod reply;

pub use self::command::ClientLine;
pub use self::error::{ProtocolError, Result};
#[cfg(feature = "tokio")]
pub use self::line::{DEFAULT_MAX_LINE_LEN, LineCodec};
pub use self::presence::{DEFAULT_STATUS, Presence, PresenceEntry};
pub use self::reply::{PresenceEvent, ServerLine};

/// Field delimiter used by every tagged command.
pub const DELIMITER: &str = "::";
