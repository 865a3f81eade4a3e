//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::afkers::AfkersArgs;
use crate::commands::seeders::SeedersArgs;

/// Scripts for gathering and processing BattleMetrics data.
///
/// Ranks the players who keep a server alive while it is under-populated,
/// and lists connected players who are not in a squad.
#[derive(Debug, Parser)]
#[command(name = "bm", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rank players by seed time over a recent window.
    Seeders(SeedersArgs),

    /// List connected players without a squad.
    Afkers(AfkersArgs),
}
