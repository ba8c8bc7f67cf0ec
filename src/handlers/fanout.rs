//! Per-recipient delivery bookkeeping for one fan-out.

use crate::error::DeliveryError;
use crate::state::Recipient;
use tracing::{debug, warn};

/// Outcome of delivering one line to a set of sessions.
///
/// A failed recipient never stops delivery to the rest; failures are
/// captured here instead.
#[derive(Debug, Default)]
pub struct Fanout {
    pub delivered: usize,
    pub failed: Vec<(String, DeliveryError)>,
}

impl Fanout {
    /// Record one delivery attempt.
    ///
    /// A full send queue disconnects that recipient. A closed one is
    /// already on its way out and is only noted.
    pub(crate) fn record(&mut self, recipient: &Recipient, result: Result<(), DeliveryError>) {
        match result {
            Ok(()) => self.delivered += 1,
            Err(err) => {
                match err {
                    DeliveryError::QueueFull => {
                        warn!(
                            username = %recipient.name,
                            session = %recipient.handle.id(),
                            "Send queue exceeded, disconnecting"
                        );
                        recipient.handle.close();
                    }
                    DeliveryError::Closed => {
                        debug!(username = %recipient.name, "Skipping closed session");
                    }
                }
                self.failed.push((recipient.name.clone(), err));
            }
        }
    }

    /// Fold another fan-out into this one.
    pub fn merge(&mut self, other: Fanout) {
        self.delivered += other.delivered;
        self.failed.extend(other.failed);
    }

    pub fn attempted(&self) -> usize {
        self.delivered + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
