//! Unified error handling for relayd.
//!
//! Session errors end one connection and nothing else. Delivery errors are
//! collected per recipient during fan-out and never abort it.

use relay_proto::ProtocolError;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Session Errors (connection lifecycle)
// ============================================================================

/// Reasons a session ended before or while Active.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("no username within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("peer closed before sending a username")]
    NoUsername,

    #[error("blank username")]
    BlankUsername,

    #[error("username already taken: {0}")]
    UsernameTaken(String),

    #[error("cancelled during handshake")]
    Cancelled,
}

impl SessionError {
    /// Get a static error code string for log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "protocol",
            Self::HandshakeTimeout(_) => "handshake_timeout",
            Self::NoUsername => "no_username",
            Self::BlankUsername => "blank_username",
            Self::UsernameTaken(_) => "username_taken",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the session was turned away by the handshake rules rather
    /// than by a transport problem.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::BlankUsername | Self::UsernameTaken(_))
    }
}

// ============================================================================
// Delivery Errors (fan-out)
// ============================================================================

/// A single recipient could not be handed a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The recipient's send queue is full; it gets disconnected.
    #[error("send queue exceeded")]
    QueueFull,

    /// The recipient's writer has already gone away.
    #[error("session closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SessionError::BlankUsername.error_code(), "blank_username");
        assert_eq!(
            SessionError::HandshakeTimeout(Duration::from_secs(3)).error_code(),
            "handshake_timeout"
        );
    }

    #[test]
    fn test_rejections() {
        assert!(SessionError::UsernameTaken("eve".into()).is_rejection());
        assert!(SessionError::BlankUsername.is_rejection());
        assert!(!SessionError::NoUsername.is_rejection());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            SessionError::UsernameTaken("eve".into()).to_string(),
            "username already taken: eve"
        );
        assert_eq!(DeliveryError::QueueFull.to_string(), "send queue exceeded");
    }
}
