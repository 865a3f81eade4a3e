//! Seed-time attribution sweep.
//!
//! Replays session starts in chronological order and credits players who were
//! online while the server population stayed below the desired threshold.
//!
//! # Algorithm Summary
//!
//! 1. Keep a working set of sessions believed to be open, each with the
//!    instant up to which it has already been credited (`last_credited`).
//! 2. When a session starts, walk the working set: while the live set is
//!    smaller than the threshold, credit each member from `last_credited` up
//!    to the new start. Members still connected move `last_credited` forward;
//!    members that already left are dropped.
//! 3. When the input runs out, a set still below the threshold credits every
//!    remaining member up to its stop (or the window end when still connected).

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::player::PlayerKey;
use crate::session::Session;
use crate::tracker::{TimeTracker, TrackerError};

/// Smallest population threshold that can leave anyone below it.
pub const MIN_DESIRED_PLAYERS: usize = 2;

/// Configuration for the seed-time sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Population at which the server counts as seeded. Credit is only given
    /// while fewer sessions than this are open.
    pub desired_players: usize,

    /// End of the observation window. Sessions without a stop time are
    /// treated as ending here.
    pub window_end: DateTime<Utc>,
}

/// Errors raised by [`seed_time`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SweepError {
    #[error("desired players must be at least {MIN_DESIRED_PLAYERS}, got {0}")]
    InvalidThreshold(usize),

    /// Sessions must be sorted by start time before the sweep.
    #[error("session {index} starts at {start}, before the previous session at {previous}")]
    OutOfOrder {
        index: usize,
        start: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// A session in the working set.
#[derive(Debug, Clone)]
struct OpenSession<'a> {
    session: &'a Session,
    /// Credit has been considered up to this instant.
    last_credited: DateTime<Utc>,
    /// Stop time with open sessions resolved to the window end.
    stop: DateTime<Utc>,
}

impl OpenSession<'_> {
    fn key(&self) -> PlayerKey {
        PlayerKey::for_session(self.session.player_id(), self.session.name())
    }

    fn credit_until(
        &self,
        until: DateTime<Utc>,
        tracker: &mut TimeTracker,
    ) -> Result<(), TrackerError> {
        let seconds = (until - self.last_credited).num_seconds();
        tracker.add(self.key(), self.session.name(), seconds)
    }
}

/// Computes seed time for sessions sorted by ascending start.
///
/// Durations are whole seconds; sub-second remainders are truncated.
///
/// # Arguments
///
/// * `sessions` - Sessions ordered by start time (ties in any order)
/// * `config` - Threshold and window end
pub fn seed_time(sessions: &[Session], config: &SweepConfig) -> Result<TimeTracker, SweepError> {
    if config.desired_players < MIN_DESIRED_PLAYERS {
        return Err(SweepError::InvalidThreshold(config.desired_players));
    }
    ensure_chronological(sessions)?;

    let mut tracker = TimeTracker::new();
    let mut open: Vec<OpenSession<'_>> = Vec::new();

    for session in sessions {
        let cursor = session.start();

        // The threshold check sees removals made earlier in this same pass.
        let mut live = open.len();
        let mut still_open = Vec::with_capacity(open.len() + 1);
        for mut entry in std::mem::take(&mut open) {
            if live < config.desired_players {
                entry.credit_until(cursor, &mut tracker)?;
            }
            if cursor < entry.stop {
                entry.last_credited = cursor;
                still_open.push(entry);
            } else {
                live -= 1;
            }
        }

        still_open.push(OpenSession {
            session,
            last_credited: cursor,
            stop: session.stop_or(config.window_end),
        });
        open = still_open;
    }

    tracing::debug!(
        sessions = sessions.len(),
        still_open = open.len(),
        "sweep reached end of input"
    );

    if open.len() < config.desired_players {
        for entry in &open {
            entry.credit_until(entry.stop, &mut tracker)?;
        }
    }

    Ok(tracker)
}

fn ensure_chronological(sessions: &[Session]) -> Result<(), SweepError> {
    for (index, pair) in sessions.windows(2).enumerate() {
        let (previous, current) = (pair[0].start(), pair[1].start());
        if current < previous {
            return Err(SweepError::OutOfOrder {
                index: index + 1,
                start: current,
                previous,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .single()
            .expect("valid test timestamp")
            + Duration::seconds(seconds)
    }

    fn session(id: &str, start: i64, stop: i64) -> Session {
        Session::new(Some(id.to_string()), id, ts(start), Some(ts(stop))).unwrap()
    }

    fn open_session(id: &str, start: i64) -> Session {
        Session::new(Some(id.to_string()), id, ts(start), None).unwrap()
    }

    fn config(desired_players: usize, window_end: i64) -> SweepConfig {
        SweepConfig {
            desired_players,
            window_end: ts(window_end),
        }
    }

    fn seconds(tracker: &TimeTracker, id: &str) -> Option<u64> {
        tracker.lookup_by_id(id).map(|player| player.total_seconds())
    }

    fn three_players() -> Vec<Session> {
        vec![
            session("p1", 0, 100),
            session("p2", 10, 100),
            session("p3", 20, 30),
        ]
    }

    #[test]
    fn test_empty_sessions() {
        let tracker = seed_time(&[], &config(2, 100)).unwrap();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_threshold_two_stops_credit_once_second_player_joins() {
        let tracker = seed_time(&three_players(), &config(2, 100)).unwrap();

        // p1 alone from 0 to 10; from then on at least two are online.
        assert_eq!(seconds(&tracker, "p1"), Some(10));
        assert_eq!(seconds(&tracker, "p2"), None);
        assert_eq!(seconds(&tracker, "p3"), None);
    }

    #[test]
    fn test_threshold_three_credits_until_third_player_joins() {
        let tracker = seed_time(&three_players(), &config(3, 100)).unwrap();

        // p1: 0..10 and 10..20. p2: 10..20. Three online from 20 onward.
        assert_eq!(seconds(&tracker, "p1"), Some(20));
        assert_eq!(seconds(&tracker, "p2"), Some(10));
        assert_eq!(seconds(&tracker, "p3"), None);
    }

    #[test]
    fn test_threshold_above_peak_credits_full_sessions() {
        let tracker = seed_time(&three_players(), &config(4, 100)).unwrap();

        assert_eq!(seconds(&tracker, "p1"), Some(100));
        assert_eq!(seconds(&tracker, "p2"), Some(90));
        assert_eq!(seconds(&tracker, "p3"), Some(10));
    }

    #[test]
    fn test_single_open_session_credited_to_window_end() {
        let sessions = vec![open_session("p1", 0)];
        let tracker = seed_time(&sessions, &config(2, 3_600)).unwrap();

        assert_eq!(seconds(&tracker, "p1"), Some(3_600));
    }

    #[test]
    fn test_open_sessions_flushed_once() {
        let sessions = vec![session("p1", 0, 50), open_session("p2", 20)];
        let tracker = seed_time(&sessions, &config(3, 200)).unwrap();

        // p1: 0..20 at p2's join, then 20..50 at the end. p2: 20..200.
        assert_eq!(seconds(&tracker, "p1"), Some(50));
        assert_eq!(seconds(&tracker, "p2"), Some(180));
    }

    #[test]
    fn test_no_flush_when_final_population_reaches_threshold() {
        let sessions = vec![open_session("p1", 0), open_session("p2", 30)];
        let tracker = seed_time(&sessions, &config(2, 500)).unwrap();

        assert_eq!(seconds(&tracker, "p1"), Some(30));
        assert_eq!(seconds(&tracker, "p2"), None);
    }

    #[test]
    fn test_departed_session_credited_up_to_next_join() {
        // Nobody overlaps; each departure is only noticed at the next join.
        let sessions = vec![
            session("a", 0, 10),
            session("b", 20, 30),
            session("c", 40, 50),
        ];
        let tracker = seed_time(&sessions, &config(3, 100)).unwrap();

        assert_eq!(seconds(&tracker, "a"), Some(20));
        assert_eq!(seconds(&tracker, "b"), Some(20));
        assert_eq!(seconds(&tracker, "c"), Some(10));
    }

    #[test]
    fn test_threshold_uses_live_working_set_size() {
        // At d's join the set is {a, b, c}. With a threshold of 3 the first
        // entry is not credited, but once `a` is dropped the live size is 2
        // and the rest are.
        let sessions = vec![
            session("a", 0, 5),
            session("b", 1, 100),
            session("c", 2, 100),
            session("d", 10, 100),
        ];
        let tracker = seed_time(&sessions, &config(3, 100)).unwrap();

        // a: 0..1 (alone), 1..2 (pair), then skipped at d's join.
        assert_eq!(seconds(&tracker, "a"), Some(2));
        // b: 1..2 (pair), then 2..10 at d's join because `a` was dropped.
        assert_eq!(seconds(&tracker, "b"), Some(9));
        // c: 2..10 at d's join.
        assert_eq!(seconds(&tracker, "c"), Some(8));
        assert_eq!(seconds(&tracker, "d"), None);
    }

    #[test]
    fn test_population_drop_resumes_credit() {
        let sessions = vec![
            session("a", 0, 20),
            session("b", 10, 15),
            session("c", 30, 40),
        ];
        let tracker = seed_time(&sessions, &config(2, 100)).unwrap();

        // a: 0..10 alone. At c's join the set {a, b} is full when a is
        // visited; dropping a leaves b alone, so b is credited 10..30 before
        // it is dropped too. c closes alone: 30..40.
        assert_eq!(seconds(&tracker, "a"), Some(10));
        assert_eq!(seconds(&tracker, "b"), Some(20));
        assert_eq!(seconds(&tracker, "c"), Some(10));
    }

    #[test]
    fn test_equal_start_times_are_order_independent() {
        let forward = vec![
            session("a", 0, 60),
            session("b", 0, 30),
            session("c", 20, 90),
        ];
        let swapped = vec![
            session("b", 0, 30),
            session("a", 0, 60),
            session("c", 20, 90),
        ];

        let first = seed_time(&forward, &config(4, 100)).unwrap();
        let second = seed_time(&swapped, &config(4, 100)).unwrap();

        for id in ["a", "b", "c"] {
            assert_eq!(seconds(&first, id), seconds(&second, id), "player {id}");
        }
        assert_eq!(seconds(&first, "a"), Some(60));
        assert_eq!(seconds(&first, "b"), Some(30));
        assert_eq!(seconds(&first, "c"), Some(70));
    }

    #[test]
    fn test_overlapping_sessions_credit_each_interval_once() {
        // Below threshold throughout: every player gets exactly their own
        // connected time, however many joins split it.
        let sessions = vec![
            session("a", 0, 100),
            session("b", 10, 60),
            session("c", 25, 80),
        ];
        let tracker = seed_time(&sessions, &config(10, 100)).unwrap();

        assert_eq!(seconds(&tracker, "a"), Some(100));
        assert_eq!(seconds(&tracker, "b"), Some(50));
        assert_eq!(seconds(&tracker, "c"), Some(55));
        assert_eq!(tracker.total_seconds(), 205);
    }

    #[test]
    fn test_repeat_sessions_accumulate_per_player() {
        let sessions = vec![
            Session::new(Some("1".to_string()), "old-name", ts(0), Some(ts(10))).unwrap(),
            Session::new(Some("1".to_string()), "new-name", ts(50), Some(ts(70))).unwrap(),
        ];
        let tracker = seed_time(&sessions, &config(2, 100)).unwrap();

        let player = tracker.lookup_by_id("1").unwrap();
        // First session is credited up to the second join (0..50), second 50..70.
        assert_eq!(player.total_seconds(), 70);
        assert_eq!(player.names(), ["old-name", "new-name"]);
    }

    #[test]
    fn test_anonymous_sessions_tracked_by_name() {
        let sessions = vec![
            Session::new(None, "ghost", ts(0), Some(ts(10))).unwrap(),
            Session::new(None, "phantom", ts(20), Some(ts(25))).unwrap(),
        ];
        let tracker = seed_time(&sessions, &config(2, 100)).unwrap();

        assert_eq!(tracker.len(), 2);
        let ghost = tracker
            .lookup_by_key(&PlayerKey::Anonymous("ghost".to_string()))
            .unwrap();
        assert_eq!(ghost.total_seconds(), 20);
        assert_eq!(tracker.lookup_by_name("phantom")[0].total_seconds(), 5);
    }

    #[test]
    fn test_sub_second_remainders_truncated() {
        let start = ts(0);
        let sessions = vec![
            Session::new(
                Some("1".to_string()),
                "p1",
                start,
                Some(start + Duration::milliseconds(2_999)),
            )
            .unwrap(),
        ];
        let tracker = seed_time(&sessions, &config(2, 100)).unwrap();

        assert_eq!(seconds(&tracker, "1"), Some(2));
    }

    #[test]
    fn test_multi_day_sessions_counted_in_full() {
        let sessions = vec![session("p1", 0, 3 * 86_400 + 5)];
        let tracker = seed_time(&sessions, &config(2, 4 * 86_400)).unwrap();

        assert_eq!(seconds(&tracker, "p1"), Some(3 * 86_400 + 5));
    }

    #[test]
    fn test_rejects_unsorted_sessions() {
        let sessions = vec![session("a", 10, 20), session("b", 5, 20)];
        let err = seed_time(&sessions, &config(2, 100)).unwrap_err();

        assert_eq!(
            err,
            SweepError::OutOfOrder {
                index: 1,
                start: ts(5),
                previous: ts(10),
            }
        );
    }

    #[test]
    fn test_rejects_threshold_below_two() {
        let err = seed_time(&three_players(), &config(1, 100)).unwrap_err();
        assert_eq!(err, SweepError::InvalidThreshold(1));
    }

    #[test]
    fn test_window_end_before_open_start_is_an_error() {
        let sessions = vec![open_session("p1", 100)];
        let err = seed_time(&sessions, &config(2, 50)).unwrap_err();

        assert!(matches!(
            err,
            SweepError::Tracker(TrackerError::NegativeDuration { seconds: -50, .. })
        ));
    }
}
