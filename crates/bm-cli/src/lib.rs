//! BattleMetrics reporting CLI library.
//!
//! This crate provides the CLI interface for the seed-time and AFK reports.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
