//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::{Ipv4Addr, SocketAddr};

/// Port used when neither the command line nor the config file names one.
pub const DEFAULT_PORT: u16 = 1234;

// =============================================================================
// Listen Defaults
// =============================================================================

pub fn default_listen_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT))
}

// =============================================================================
// Limit Defaults
// =============================================================================

pub fn default_max_line_length() -> usize {
    relay_proto::DEFAULT_MAX_LINE_LEN
}

pub fn default_send_queue() -> usize {
    1024
}

// =============================================================================
// Timeout Defaults
// =============================================================================

pub fn default_handshake_timeout() -> u64 {
    30
}
