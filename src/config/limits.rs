//! Per-session resource limits and timeouts.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{default_handshake_timeout, default_max_line_length, default_send_queue};

/// Per-session resource limits.
///
/// File payloads arrive as one long line, so `max_line_length` bounds the
/// largest file a client can relay.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum inbound line length in bytes (default: 64 MiB).
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Outbound lines buffered per session before it is dropped as a slow
    /// consumer (default: 1024).
    #[serde(default = "default_send_queue")]
    pub send_queue: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            send_queue: default_send_queue(),
        }
    }
}

/// Timeout configuration.
///
/// Active sessions have no idle timeout; only the username exchange is
/// bounded.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    /// Seconds allowed between the prompt and the username line (default: 30).
    #[serde(default = "default_handshake_timeout")]
    pub handshake: u64,
}

impl TimeoutsConfig {
    pub fn handshake(&self) -> Duration {
        Duration::from_secs(self.handshake)
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            handshake: default_handshake_timeout(),
        }
    }
}
