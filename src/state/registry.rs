//! Shared presence registry.
//!
//! The Registry is the only owner of cross-session state: claimed usernames,
//! their outbound handles, and their statuses. All of it sits behind one
//! lock so a username and its session are inserted and removed together,
//! and every snapshot is a single point in time.
//!
//! Guards are never held across `.await`; callers get owned snapshots.

use crate::error::DeliveryError;
use crate::state::SessionId;
use parking_lot::RwLock;
use relay_proto::{DEFAULT_STATUS, Presence, PresenceEntry};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// An outbound line, shared between every recipient of a fan-out.
pub type Line = Arc<str>;

/// The Registry's view of one session: where to send its lines and how to
/// stop it.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    tx: mpsc::Sender<Line>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    pub fn new(id: SessionId, tx: mpsc::Sender<Line>, shutdown: CancellationToken) -> Self {
        Self { id, tx, shutdown }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queue a line without waiting. Never blocks the caller on a slow peer.
    pub fn deliver(&self, line: &Line) -> Result<(), DeliveryError> {
        self.tx.try_send(Arc::clone(line)).map_err(|err| match err {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Ask the session to close. Its read loop exits and it deregisters
    /// itself through the normal path.
    pub fn close(&self) {
        self.shutdown.cancel();
    }
}

/// One fan-out target.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub name: String,
    pub handle: SessionHandle,
}

/// Presence listing and the sessions it lists, taken under one lock.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub presence: Presence,
    pub recipients: Vec<Recipient>,
}

struct Member {
    handle: SessionHandle,
    status: Option<String>,
    joined: u64,
    /// Leaving: hidden from presence and fan-out, but the name stays taken.
    departing: bool,
}

#[derive(Default)]
struct Members {
    by_name: HashMap<String, Member>,
    next_join: u64,
}

impl Members {
    /// Members that are not departing, in join order.
    fn ordered(&self) -> Vec<(&String, &Member)> {
        let mut members: Vec<_> = self
            .by_name
            .iter()
            .filter(|(_, member)| !member.departing)
            .collect();
        members.sort_unstable_by_key(|(_, member)| member.joined);
        members
    }
}

/// Shared store of Active sessions, their usernames and statuses.
#[derive(Default)]
pub struct Registry {
    members: RwLock<Members>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `name` for the session behind `handle`.
    ///
    /// Returns `None` without touching any state if the name is taken.
    /// The returned [`Claim`] releases the name when dropped.
    pub fn try_claim(self: &Arc<Self>, name: &str, handle: SessionHandle) -> Option<Claim> {
        let id = handle.id();
        let mut members = self.members.write();
        let joined = members.next_join;

        match members.by_name.entry(name.to_string()) {
            Entry::Occupied(_) => return None,
            Entry::Vacant(slot) => {
                slot.insert(Member {
                    handle,
                    status: None,
                    joined,
                    departing: false,
                });
            }
        }
        members.next_join += 1;
        drop(members);

        Some(Claim {
            registry: Arc::clone(self),
            name: name.to_string(),
            id,
            released: false,
        })
    }

    /// Hide `name` from presence and fan-out while keeping it claimed, if it
    /// still belongs to session `id`.
    fn retire_session(&self, name: &str, id: SessionId) -> bool {
        match self.members.write().by_name.get_mut(name) {
            Some(member) if member.handle.id() == id => {
                member.departing = true;
                true
            }
            _ => false,
        }
    }

    /// Remove `name` only if it still belongs to session `id`, so a stale
    /// release can never evict a later claimant of the same name.
    fn release_session(&self, name: &str, id: SessionId) -> bool {
        let mut members = self.members.write();
        match members.by_name.get(name) {
            Some(member) if member.handle.id() == id => {
                members.by_name.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Set the status of a claimed name. Ignored if `name` is not claimed.
    pub fn set_status(&self, name: &str, status: &str) -> bool {
        match self.members.write().by_name.get_mut(name) {
            Some(member) => {
                member.status = Some(status.to_string());
                true
            }
            None => {
                debug!(username = %name, "Status update for unclaimed name ignored");
                false
            }
        }
    }

    /// Every Active session in join order.
    pub fn recipients(&self) -> Vec<Recipient> {
        self.members
            .read()
            .ordered()
            .into_iter()
            .map(|(name, member)| Recipient {
                name: name.clone(),
                handle: member.handle.clone(),
            })
            .collect()
    }

    /// Presence listing and recipients from the same instant.
    pub fn snapshot(&self) -> Snapshot {
        let members = self.members.read();
        let ordered = members.ordered();

        let presence = ordered
            .iter()
            .map(|(name, member)| {
                PresenceEntry::new(
                    name.as_str(),
                    member.status.as_deref().unwrap_or(DEFAULT_STATUS),
                )
            })
            .collect();
        let recipients = ordered
            .into_iter()
            .map(|(name, member)| Recipient {
                name: name.clone(),
                handle: member.handle.clone(),
            })
            .collect();

        Snapshot {
            presence,
            recipients,
        }
    }

    /// Number of sessions listed in presence.
    pub fn len(&self) -> usize {
        self.members
            .read()
            .by_name
            .values()
            .filter(|member| !member.departing)
            .count()
    }
}

#[cfg(test)]
impl Registry {
    /// Remove `name` regardless of owner. Idempotent.
    pub fn release(&self, name: &str) -> bool {
        self.members.write().by_name.remove(name).is_some()
    }

    pub fn snapshot_presence(&self) -> Presence {
        self.snapshot().presence
    }

    /// Whether `name` is claimed, departing or not.
    pub fn contains(&self, name: &str) -> bool {
        self.members.read().by_name.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().by_name.is_empty()
    }
}

/// Ownership of a claimed username.
///
/// Dropping the claim releases the name (if it still belongs to this
/// session), so every exit path from a session gives its name back.
#[must_use = "dropping a Claim releases the username"]
pub struct Claim {
    registry: Arc<Registry>,
    name: String,
    id: SessionId,
    released: bool,
}

impl Claim {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Drop out of presence and fan-out but keep the name, so the departure
    /// can be announced before anyone else may claim it.
    pub fn retire(&self) -> bool {
        self.registry.retire_session(&self.name, self.id)
    }

    /// Release now and report whether the name was still ours.
    pub fn release(mut self) -> bool {
        self.released = true;
        self.registry.release_session(&self.name, self.id)
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        if !self.released {
            self.registry.release_session(&self.name, self.id);
        }
    }
}

impl std::fmt::Debug for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Claim")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}
