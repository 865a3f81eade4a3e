//! CLI subcommand implementations.

pub mod afkers;
pub mod seeders;
pub mod target;
pub mod util;
