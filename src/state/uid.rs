//! Session identifiers for log correlation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for one accepted connection.
///
/// Displayed as `S` followed by six base36 characters, e.g. `S00001A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", base36_encode_6(self.0))
    }
}

/// Generates unique session IDs.
pub struct SessionIdGenerator {
    counter: AtomicU64,
}

impl Default for SessionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    /// Generate the next unique ID.
    pub fn next(&self) -> SessionId {
        SessionId(self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

/// Encode a number as a 6-character base36 string (wraps past 36^6).
fn base36_encode_6(mut n: u64) -> String {
    const CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut result = [b'0'; 6];

    for slot in result.iter_mut().rev() {
        *slot = CHARS[(n % 36) as usize];
        n /= 36;
    }

    String::from_utf8_lossy(&result).into_owned()
}
