//! State management module.
//!
//! Contains the Registry (shared presence state), session identifiers and
//! the per-session lifecycle state machine.

mod machine;
mod registry;
mod uid;

pub use machine::SessionState;
pub use registry::{Claim, Line, Recipient, Registry, SessionHandle};
pub use uid::{SessionId, SessionIdGenerator};
