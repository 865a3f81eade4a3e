//! Per-player seed-time aggregates.

use std::fmt;

use serde::Serialize;

/// Identity used to group attributed time.
///
/// Sessions without an API player id are grouped by display name so that
/// they never merge with identified players. Anonymous sessions sharing a
/// name, including the empty name, count as one player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PlayerKey {
    Id(String),
    Anonymous(String),
}

impl PlayerKey {
    /// Builds the key for a session's player id and display name.
    pub fn for_session(player_id: Option<&str>, name: &str) -> Self {
        player_id.map_or_else(
            || Self::Anonymous(name.to_string()),
            |id| Self::Id(id.to_string()),
        )
    }

    /// The API player id, if known.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            Self::Anonymous(_) => None,
        }
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => f.write_str(id),
            Self::Anonymous(name) => write!(f, "anonymous:{name}"),
        }
    }
}

/// Seed time accumulated for a single player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerAggregate {
    key: PlayerKey,
    /// Display names in first-seen order, without duplicates.
    names: Vec<String>,
    total_seconds: u64,
}

impl PlayerAggregate {
    pub(crate) fn new(key: PlayerKey, name: &str, seconds: u64) -> Self {
        Self {
            key,
            names: vec![name.to_string()],
            total_seconds: seconds,
        }
    }

    pub(crate) fn record(&mut self, name: &str, seconds: u64) {
        if !self.names.iter().any(|known| known == name) {
            self.names.push(name.to_string());
        }
        self.total_seconds = self.total_seconds.saturating_add(seconds);
    }

    pub const fn key(&self) -> &PlayerKey {
        &self.key
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The first name this player was seen with.
    pub fn display_name(&self) -> &str {
        self.names.first().map_or("", String::as_str)
    }

    pub const fn total_seconds(&self) -> u64 {
        self.total_seconds
    }
}
