//! Presence snapshot formatting.
//!
//! The snapshot line is `Online users: ` followed by `name|status` entries
//! joined with `, `.

use std::fmt;

/// Status reported for users who never sent `STATUS::`.
pub const DEFAULT_STATUS: &str = "Online";

/// Leading text of every presence snapshot line.
pub const PRESENCE_PREFIX: &str = "Online users: ";

const ENTRY_SEPARATOR: &str = ", ";

/// One `(username, status)` pair in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    /// Username.
    pub name: String,
    /// Current status text.
    pub status: String,
}

impl PresenceEntry {
    /// Create a new entry.
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }
}

impl fmt::Display for PresenceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.name, self.status)
    }
}

/// An ordered presence snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence(pub Vec<PresenceEntry>);

impl Presence {
    /// Parse the list portion of a snapshot line (after [`PRESENCE_PREFIX`]).
    ///
    /// Tokens without a `|` get [`DEFAULT_STATUS`]; empty tokens are skipped,
    /// so a trailing separator is tolerated.
    pub fn parse_list(list: &str) -> Self {
        let entries = list
            .split(ENTRY_SEPARATOR)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| match token.split_once('|') {
                Some((name, status)) => PresenceEntry::new(name, status),
                None => PresenceEntry::new(token, DEFAULT_STATUS),
            })
            .collect();
        Self(entries)
    }

    /// Look up the status of `name`.
    pub fn status_of(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.status.as_str())
    }

    /// Number of users in the snapshot.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nobody is online.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PresenceEntry> for Presence {
    fn from_iter<I: IntoIterator<Item = PresenceEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(PRESENCE_PREFIX)?;
        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(ENTRY_SEPARATOR)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
