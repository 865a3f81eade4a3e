//! Afkers command: list connected players who are not in a squad.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use bm_api::Client;
use bm_core::{OnlinePlayer, find_afk};
use clap::Args;
use serde::Serialize;

use super::target::{TargetArgs, resolve_server, resolve_token};
use crate::Config;

#[derive(Debug, Args)]
pub struct AfkersArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

pub fn run<W: Write>(writer: &mut W, args: &AfkersArgs, config: &Config) -> Result<()> {
    let token = resolve_token(&args.target, config)?;
    let client = Client::new(token, config.client_config()).context("failed to create API client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;

    let players = runtime.block_on(async {
        let server_id = resolve_server(&client, &args.target).await?;
        client
            .server_players(server_id)
            .await
            .with_context(|| format!("failed to fetch players for server {server_id}"))
    })?;

    let afk = find_afk(&players);
    tracing::debug!(online = players.len(), afk = afk.len(), "checked squad assignments");

    if args.json {
        writeln!(writer, "{}", format_afkers_json(&afk)?)?;
    } else {
        write!(writer, "{}", format_afkers(&afk))?;
    }
    Ok(())
}

/// Formats AFK players as a table. Nothing is printed when everyone is in a squad.
pub fn format_afkers(players: &[&OnlinePlayer]) -> String {
    let mut output = String::new();
    if players.is_empty() {
        return output;
    }

    writeln!(output, "{:<32} {:<10}{}", "Name", "Session", "Score").unwrap();
    for player in players {
        let session = format!("{}min", player.session_minutes());
        writeln!(output, "{:<32} {session:<10}{}pts", player.name, player.score).unwrap();
    }
    output
}

#[derive(Debug, Serialize)]
struct JsonAfkPlayer<'a> {
    name: &'a str,
    session_minutes: i64,
    score: i64,
}

/// Formats AFK players as a JSON array.
pub fn format_afkers_json(players: &[&OnlinePlayer]) -> Result<String> {
    let rows: Vec<_> = players
        .iter()
        .map(|player| JsonAfkPlayer {
            name: &player.name,
            session_minutes: player.session_minutes(),
            score: player.score,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}
