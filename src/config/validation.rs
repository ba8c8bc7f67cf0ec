//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("limits.max_line_length must be greater than zero")]
    ZeroLineLength,
    #[error("limits.send_queue must be greater than zero")]
    ZeroSendQueue,
    #[error("timeouts.handshake must be greater than zero")]
    ZeroHandshakeTimeout,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.limits.max_line_length == 0 {
        errors.push(ValidationError::ZeroLineLength);
    }
    // tokio's bounded channel panics on a zero capacity
    if config.limits.send_queue == 0 {
        errors.push(ValidationError::ZeroSendQueue);
    }
    if config.timeouts.handshake == 0 {
        errors.push(ValidationError::ZeroHandshakeTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
