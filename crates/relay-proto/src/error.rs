//! Error types for the relay line protocol.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line exceeded the configured maximum length.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Bytes buffered when the limit was hit.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// A server line did not match any known form.
    #[error("unrecognized server line: {0:?}")]
    UnknownLine(String),

    /// A tagged server line was missing one of its fields.
    #[error("malformed {kind} line: {line:?}")]
    Malformed {
        /// Which line form was being parsed.
        kind: &'static str,
        /// The offending line.
        line: String,
    },
}

impl ProtocolError {
    pub(crate) fn malformed(kind: &'static str, line: &str) -> Self {
        Self::Malformed {
            kind,
            line: line.to_string(),
        }
    }
}
