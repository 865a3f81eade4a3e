//! Player connection intervals.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while building a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The session claims to end before it started.
    #[error("session for {name:?} stops at {stop} before it starts at {start}")]
    StopBeforeStart {
        name: String,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    },
}

/// One player's continuous connection to a server.
///
/// `stop` is `None` while the player is still connected; the sweep resolves it
/// against the end of the observation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    player_id: Option<String>,
    name: String,
    start: DateTime<Utc>,
    stop: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a session, rejecting intervals that end before they start.
    pub fn new(
        player_id: Option<String>,
        name: impl Into<String>,
        start: DateTime<Utc>,
        stop: Option<DateTime<Utc>>,
    ) -> Result<Self, SessionError> {
        let name = name.into();
        if let Some(stop) = stop {
            if stop < start {
                return Err(SessionError::StopBeforeStart { name, start, stop });
            }
        }
        Ok(Self {
            player_id,
            name,
            start,
            stop,
        })
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    /// Display name the player used during this session.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub const fn stop(&self) -> Option<DateTime<Utc>> {
        self.stop
    }

    /// Returns the stop time, treating a still-connected session as ending at `window_end`.
    pub fn stop_or(&self, window_end: DateTime<Utc>) -> DateTime<Utc> {
        self.stop.unwrap_or(window_end)
    }

    /// Whether the player was still connected when the log was captured.
    pub const fn is_open(&self) -> bool {
        self.stop.is_none()
    }
}

/// Orders sessions for the sweep.
///
/// Feeds arrive newest first. The list is reversed and then stably sorted by
/// start time, so sessions sharing a start keep their reversed feed order.
pub fn into_chronological(mut sessions: Vec<Session>) -> Vec<Session> {
    sessions.reverse();
    sessions.sort_by_key(Session::start);
    sessions
}
