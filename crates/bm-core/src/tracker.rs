//! Aggregation of attributed seed time by player.

use std::collections::HashMap;

use thiserror::Error;

use crate::player::{PlayerAggregate, PlayerKey};

/// Errors raised by [`TimeTracker::add`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// A negative duration would corrupt the rankings.
    #[error("refusing negative duration of {seconds}s for player {key}")]
    NegativeDuration { key: PlayerKey, seconds: i64 },
}

/// Seed time per player.
#[derive(Debug, Clone, Default)]
pub struct TimeTracker {
    players: HashMap<PlayerKey, PlayerAggregate>,
}

impl TimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `seconds` to the player under `key`, recording `name` as one of
    /// their display names.
    ///
    /// Zero-second credits are ignored and create no entry.
    pub fn add(&mut self, key: PlayerKey, name: &str, seconds: i64) -> Result<(), TrackerError> {
        let Ok(seconds) = u64::try_from(seconds) else {
            return Err(TrackerError::NegativeDuration { key, seconds });
        };
        if seconds == 0 {
            tracing::trace!(%key, name, "skipping zero-second credit");
            return Ok(());
        }
        if matches!(&key, PlayerKey::Anonymous(anon) if anon.is_empty()) {
            tracing::debug!(seconds, "crediting session with neither player id nor name");
        }

        self.players
            .entry(key)
            .and_modify(|player| player.record(name, seconds))
            .or_insert_with_key(|key| PlayerAggregate::new(key.clone(), name, seconds));
        Ok(())
    }

    pub fn lookup_by_key(&self, key: &PlayerKey) -> Option<&PlayerAggregate> {
        self.players.get(key)
    }

    /// Finds an identified player by API player id.
    pub fn lookup_by_id(&self, id: &str) -> Option<&PlayerAggregate> {
        self.players.get(&PlayerKey::Id(id.to_string()))
    }

    /// Returns every player who has ever used `name`. Names are not unique.
    pub fn lookup_by_name(&self, name: &str) -> Vec<&PlayerAggregate> {
        self.players
            .values()
            .filter(|player| player.names().iter().any(|known| known == name))
            .collect()
    }

    /// Iterates players in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerAggregate> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Sum of seconds credited across all players.
    pub fn total_seconds(&self) -> u64 {
        self.players.values().map(PlayerAggregate::total_seconds).sum()
    }

    /// Players by total seconds descending, ties broken by key.
    pub fn ranked(&self) -> Vec<&PlayerAggregate> {
        let mut players: Vec<_> = self.players.values().collect();
        players.sort_by(|a, b| {
            b.total_seconds()
                .cmp(&a.total_seconds())
                .then_with(|| a.key().cmp(b.key()))
        });
        players
    }
}

impl<'a> IntoIterator for &'a TimeTracker {
    type Item = &'a PlayerAggregate;
    type IntoIter = std::collections::hash_map::Values<'a, PlayerKey, PlayerAggregate>;

    fn into_iter(self) -> Self::IntoIter {
        self.players.values()
    }
}
