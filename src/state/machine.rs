//! Session lifecycle state machine.
//!
//! ```text
//! ┌────────────┐ streams up ┌──────────────────┐ claim ok ┌────────┐
//! │ Connecting ├───────────►│ AwaitingUsername ├─────────►│ Active │
//! └─────┬──────┘            └────────┬─────────┘          └───┬────┘
//!       │                            │ blank / taken /        │ EOF / error /
//!       │                            │ timeout / EOF          │ shutdown
//!       ▼                            ▼                        ▼
//!  ┌──────────────────────────── Closed ──────────────────────────┐
//! ```
//!
//! `Closed` is terminal. There is no way back to `AwaitingUsername`; a
//! rejected client reconnects.

use std::fmt;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    AwaitingUsername,
    Active,
    Closed,
}

/// Attempted a transition the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid session transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: SessionState,
    pub to: SessionState,
}

impl SessionState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, AwaitingUsername)
                | (Connecting, Closed)
                | (AwaitingUsername, Active)
                | (AwaitingUsername, Closed)
                | (Active, Closed)
        )
    }

    /// Move to `next`, or report why not.
    pub fn advance(&mut self, next: SessionState) -> Result<(), InvalidTransition> {
        if !self.can_transition_to(next) {
            return Err(InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    #[allow(dead_code)]
    pub fn is_active(self) -> bool {
        self == SessionState::Active
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::AwaitingUsername => "awaiting_username",
            SessionState::Active => "active",
            SessionState::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let mut state = SessionState::Connecting;
        state.advance(SessionState::AwaitingUsername).unwrap();
        state.advance(SessionState::Active).unwrap();
        assert!(state.is_active());
        state.advance(SessionState::Closed).unwrap();
        assert_eq!(state, SessionState::Closed);
    }

    #[test]
    fn rejection_skips_active() {
        let mut state = SessionState::AwaitingUsername;
        state.advance(SessionState::Closed).unwrap();
        assert!(!state.is_active());
    }

    #[test]
    fn closed_is_terminal() {
        for next in [
            SessionState::Connecting,
            SessionState::AwaitingUsername,
            SessionState::Active,
            SessionState::Closed,
        ] {
            let mut state = SessionState::Closed;
            let err = state.advance(next).unwrap_err();
            assert_eq!(err.from, SessionState::Closed);
            assert_eq!(state, SessionState::Closed);
        }
    }

    #[test]
    fn cannot_skip_the_handshake() {
        let mut state = SessionState::Connecting;
        let err = state.advance(SessionState::Active).unwrap_err();
        assert_eq!(err.to_string(), "invalid session transition connecting -> active");
    }
}
