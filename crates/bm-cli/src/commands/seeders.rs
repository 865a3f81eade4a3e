//! Seeders command: rank players by seed time.
//!
//! Fetches (or reads) the session history of a server, runs the seed-time
//! sweep and prints the top players.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bm_api::{Client, parse_session_page};
use bm_core::{PlayerAggregate, Session, SweepConfig, into_chronological, seed_time};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use serde::Serialize;

use super::target::{TargetArgs, resolve_server, resolve_token};
use super::util::parse_datetime;
use crate::Config;

/// Width of the name column in the text report.
const NAME_WIDTH: usize = 32;

#[derive(Debug, Args)]
pub struct SeedersArgs {
    /// Days of history to analyze.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(0..=365))]
    pub days: u32,

    /// Population at which the server counts as seeded.
    #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u16).range(2..=999))]
    pub desired_players: u16,

    /// Number of players to show.
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u16).range(1..=9999))]
    pub size: u16,

    /// End of the window (ISO 8601 or e.g. "2 hours ago"). Defaults to now,
    /// or to the last recorded instant of the `--input` capture.
    #[arg(long)]
    pub until: Option<String>,

    /// Read captured `/sessions` responses (one JSON document per line)
    /// instead of calling the API.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Computed seeders report.
#[derive(Debug)]
pub struct SeedersReport {
    pub server_id: Option<u64>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub desired_players: usize,
    /// Top players, highest seed time first.
    pub players: Vec<PlayerAggregate>,
}

pub fn run<W: Write>(writer: &mut W, args: &SeedersArgs, config: &Config) -> Result<()> {
    let until = args.until.as_deref().map(parse_datetime).transpose()?;
    let days = Duration::days(i64::from(args.days));

    let (server_id, sessions, window_end) = match &args.input {
        Some(path) => {
            let sessions = read_session_file(path)?;
            // Open sessions in a capture end where the capture does, not at replay time.
            let window_end = until
                .or_else(|| latest_instant(&sessions))
                .unwrap_or_else(Utc::now);
            (args.target.server_id, sessions, window_end)
        }
        None => {
            let window_end = until.unwrap_or_else(Utc::now);
            let (server_id, sessions) =
                fetch_sessions(&args.target, config, window_end - days, window_end)?;
            (Some(server_id), sessions, window_end)
        }
    };
    let window_start = window_end - days;
    tracing::debug!(sessions = sessions.len(), "loaded session history");

    let desired_players = usize::from(args.desired_players);
    let tracker = seed_time(
        &sessions,
        &SweepConfig {
            desired_players,
            window_end,
        },
    )
    .context("failed to compute seed time")?;

    let report = SeedersReport {
        server_id,
        window_start,
        window_end,
        desired_players,
        players: tracker
            .ranked()
            .into_iter()
            .take(usize::from(args.size))
            .cloned()
            .collect(),
    };

    if args.json {
        writeln!(writer, "{}", format_seeders_json(&report)?)?;
    } else {
        write!(writer, "{}", format_seeders(&report))?;
    }
    Ok(())
}

fn fetch_sessions(
    target: &TargetArgs,
    config: &Config,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<(u64, Vec<Session>)> {
    let token = resolve_token(target, config)?;
    let client = Client::new(token, config.client_config()).context("failed to create API client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;

    runtime.block_on(async {
        let server_id = resolve_server(&client, target).await?;
        let sessions = client
            .fetch_sessions(server_id, window_start, window_end)
            .await
            .with_context(|| format!("failed to fetch sessions for server {server_id}"))?;
        Ok::<_, anyhow::Error>((server_id, sessions))
    })
}

/// Reads captured `/sessions` pages, one response document per line.
pub fn read_session_file(path: &Path) -> Result<Vec<Session>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut sessions = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let page = parse_session_page(line)
            .with_context(|| format!("{}:{}: invalid session page", path.display(), index + 1))?;
        sessions.extend(page.sessions);
    }
    Ok(into_chronological(sessions))
}

/// Latest start or stop recorded in `sessions`.
fn latest_instant(sessions: &[Session]) -> Option<DateTime<Utc>> {
    sessions
        .iter()
        .flat_map(|session| std::iter::once(session.start()).chain(session.stop()))
        .max()
}

// ========== Formatting ==========

/// Formats seconds as "Xhrs Ymins".
///
/// Minutes round up before wrapping at 60, so 3599s reads "0hrs 0mins".
pub fn format_seed_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = seconds.div_ceil(60) % 60;
    format!("{hours}hrs {minutes}mins")
}

/// Formats the human-readable report: one row per player.
pub fn format_seeders(report: &SeedersReport) -> String {
    let mut output = String::new();
    for player in &report.players {
        writeln!(
            output,
            "{:<NAME_WIDTH$} {}",
            player.display_name(),
            format_seed_duration(player.total_seconds())
        )
        .unwrap();
    }
    output
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    server_id: Option<u64>,
    window: JsonWindow,
    desired_players: usize,
    players: Vec<JsonPlayer<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonWindow {
    start: String,
    end: String,
}

#[derive(Debug, Serialize)]
struct JsonPlayer<'a> {
    id: Option<&'a str>,
    names: &'a [String],
    total_seconds: u64,
}

/// Formats the report as JSON.
pub fn format_seeders_json(report: &SeedersReport) -> Result<String> {
    let json = JsonReport {
        server_id: report.server_id,
        window: JsonWindow {
            start: report.window_start.to_rfc3339(),
            end: report.window_end.to_rfc3339(),
        },
        desired_players: report.desired_players,
        players: report
            .players
            .iter()
            .map(|player| JsonPlayer {
                id: player.key().id(),
                names: player.names(),
                total_seconds: player.total_seconds(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}
