//! Core domain logic for server seed-time analysis.
//!
//! This crate contains the fundamental types and logic for:
//! - Sessions: player connection intervals recovered from server logs
//! - Sweep: attributing seed time to players online below a population threshold
//! - Tracking: per-player aggregates and rankings
//! - AFK detection: players without a squad in a live snapshot

pub mod afk;
pub mod player;
pub mod session;
mod sweep;
pub mod tracker;

pub use afk::{OnlinePlayer, find_afk};
pub use player::{PlayerAggregate, PlayerKey};
pub use session::{Session, SessionError, into_chronological};
pub use sweep::{MIN_DESIRED_PLAYERS, SweepConfig, SweepError, seed_time};
pub use tracker::{TimeTracker, TrackerError};
