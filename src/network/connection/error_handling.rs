//! Classification and logging of session-ending errors.

use crate::error::SessionError;
use relay_proto::ProtocolError;
use tracing::{debug, info, warn};

/// Classification of transport read errors.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum ReadErrorAction {
    /// A line exceeded the configured limit; the framing is lost, so close.
    InputTooLong { actual: usize, limit: usize },
    /// The connection is broken; log quietly and close.
    IoError,
    /// Anything else the codec reports.
    Protocol,
}

/// Classify a transport read error into an actionable category.
pub(super) fn classify_read_error(e: &ProtocolError) -> ReadErrorAction {
    match e {
        ProtocolError::LineTooLong { actual, limit } => ReadErrorAction::InputTooLong {
            actual: *actual,
            limit: *limit,
        },
        ProtocolError::Io(_) => ReadErrorAction::IoError,
        _ => ReadErrorAction::Protocol,
    }
}

/// Log a read error that ended a session.
pub(super) fn log_read_error(e: &ProtocolError) {
    match classify_read_error(e) {
        ReadErrorAction::InputTooLong { actual, limit } => {
            warn!(actual, limit, "Input line too long, closing session");
        }
        ReadErrorAction::IoError => debug!(error = %e, "Read failed, closing session"),
        ReadErrorAction::Protocol => warn!(error = %e, "Protocol error, closing session"),
    }
}

/// Log why a session never became Active.
pub(super) fn log_handshake_failure(e: &SessionError) {
    match e {
        SessionError::Protocol(inner) => log_read_error(inner),
        e if e.is_rejection() => {
            info!(code = e.error_code(), error = %e, "Username rejected")
        }
        SessionError::HandshakeTimeout(_) => {
            info!(code = e.error_code(), error = %e, "Handshake timed out")
        }
        _ => debug!(code = e.error_code(), "Handshake abandoned"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let too_long = ProtocolError::LineTooLong {
            actual: 10,
            limit: 4,
        };
        assert_eq!(
            classify_read_error(&too_long),
            ReadErrorAction::InputTooLong {
                actual: 10,
                limit: 4
            }
        );

        let io = ProtocolError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset));
        assert_eq!(classify_read_error(&io), ReadErrorAction::IoError);

        let other = ProtocolError::UnknownLine("?".into());
        assert_eq!(classify_read_error(&other), ReadErrorAction::Protocol);
    }
}
