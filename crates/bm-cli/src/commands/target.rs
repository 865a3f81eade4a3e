//! Token and server selection shared by the API-backed commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bm_api::{Client, ServerSummary};
use clap::Args;

use crate::Config;

/// Which server to query, and with which credentials.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// BattleMetrics API token.
    #[arg(long, conflicts_with = "token_path")]
    pub token: Option<String>,

    /// File containing the BattleMetrics API token.
    #[arg(long)]
    pub token_path: Option<PathBuf>,

    /// Numeric server id.
    #[arg(long, conflicts_with = "server_name")]
    pub server_id: Option<u64>,

    /// Server name to search for; must match exactly one online server.
    #[arg(long)]
    pub server_name: Option<String>,
}

/// Picks the API token: flags first, then configuration.
pub fn resolve_token(args: &TargetArgs, config: &Config) -> Result<String> {
    if let Some(token) = non_empty(args.token.as_deref()) {
        return Ok(token.to_string());
    }
    if let Some(path) = &args.token_path {
        return read_token_file(path);
    }
    if let Some(token) = non_empty(config.token.as_deref()) {
        return Ok(token.to_string());
    }
    if let Some(path) = &config.token_path {
        return read_token_file(path);
    }
    bail!("missing API token (pass --token or --token-path, or set BM_TOKEN)")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Reads a token file, dropping line breaks.
pub fn read_token_file(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read token file {}", path.display()))?;
    let token = raw.replace(['\n', '\r'], "");
    if token.trim().is_empty() {
        bail!("token file {} is empty", path.display());
    }
    Ok(token)
}

/// Resolves the server id, searching by name when no id was given.
pub async fn resolve_server(client: &Client, args: &TargetArgs) -> Result<u64> {
    if let Some(id) = args.server_id {
        return Ok(id);
    }
    let Some(name) = args.server_name.as_deref() else {
        bail!("--server-id or --server-name is required");
    };

    let servers = client
        .search_servers(name, true)
        .await
        .with_context(|| format!("failed to search servers for {name:?}"))?;
    tracing::debug!(name, matches = servers.len(), "server search finished");
    pick_server(name, &servers)
}

/// Accepts a name search only when it matched exactly one server.
pub fn pick_server(name: &str, servers: &[ServerSummary]) -> Result<u64> {
    match servers {
        [only] => Ok(only.id),
        [] => bail!("--server-name={name:?} is not valid: no online server matches"),
        many => {
            let candidates = many
                .iter()
                .map(|server| format!("{} ({})", server.name, server.id))
                .collect::<Vec<_>>()
                .join(", ");
            bail!("--server-name={name:?} is not valid: matches {candidates}")
        }
    }
}
