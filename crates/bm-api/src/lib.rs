//! BattleMetrics API integration.
//!
//! Provides the data sources for the seed-time and AFK reports:
//! - Paginated session history for a server
//! - Server search by name
//! - Live player snapshot for a server

mod wire;

use std::fmt;
use std::time::Duration;

use bm_core::{OnlinePlayer, Session, into_chronological};
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

pub use wire::{
    ServerSummary, SessionPage, parse_server_list, parse_server_players, parse_session_page,
};

/// Public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.battlemetrics.com";
/// Sessions requested per page.
pub const PAGE_SIZE: u32 = 100;
/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// API client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The provided bearer token was invalid.
    #[error("invalid API token: {reason}")]
    InvalidToken { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Every attempt at a request failed.
    #[error("giving up on {url} after {attempts} attempts: {last_failure}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_failure: String,
    },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// A session entry could not be turned into a usable interval.
    #[error("invalid session {id}: {reason}")]
    InvalidSession { id: String, reason: String },
}

/// Connection settings for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Attempts per request, including the first.
    pub retry_attempts: u32,
    /// Pause between attempts.
    pub retry_backoff: Duration,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// BattleMetrics API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    token: String,
    config: ClientConfig,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("token", &"[REDACTED]")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client with the given bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or whitespace-only, or if the
    /// HTTP client fails to build.
    pub fn new(token: impl Into<String>, config: ClientConfig) -> Result<Self, ApiError> {
        let token = token.into();

        if token.is_empty() {
            return Err(ApiError::InvalidToken {
                reason: "token cannot be empty",
            });
        }
        if token.trim().is_empty() {
            return Err(ApiError::InvalidToken {
                reason: "token cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self {
            http,
            token,
            config: ClientConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                retry_attempts: config.retry_attempts.max(1),
                ..config
            },
        })
    }

    /// Fetches every session on `server_id` overlapping `[start, end]`.
    ///
    /// Pages are followed until the feed runs out. The result is ordered by
    /// ascending start time, ready for the sweep.
    pub async fn fetch_sessions(
        &self,
        server_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>, ApiError> {
        let query = session_query(server_id, start, end);
        let first_url = format!("{}/sessions", self.config.base_url);

        let mut sessions = Vec::new();
        let mut pages = 0_usize;
        let mut body = self.get_with_retry(&first_url, &query).await?;
        loop {
            let page = parse_session_page(&body)?;
            pages += 1;
            tracing::debug!(page = pages, sessions = page.sessions.len(), "fetched session page");
            sessions.extend(page.sessions);

            // The next link already carries the query.
            let Some(next) = page.next else { break };
            body = self.get_with_retry(&next, &[]).await?;
        }

        tracing::debug!(pages, sessions = sessions.len(), "session history complete");
        Ok(into_chronological(sessions))
    }

    /// Searches servers by name.
    pub async fn search_servers(
        &self,
        name: &str,
        online_only: bool,
    ) -> Result<Vec<ServerSummary>, ApiError> {
        let url = format!("{}/servers", self.config.base_url);
        let query = [
            ("fields[server]".to_string(), "name,status".to_string()),
            ("filter[search]".to_string(), format!("\"{name}\"")),
        ];
        let body = self.get_with_retry(&url, &query).await?;
        let mut servers = parse_server_list(&body)?;
        if online_only {
            servers.retain(ServerSummary::is_online);
        }
        Ok(servers)
    }

    /// Fetches the players currently connected to `server_id`.
    pub async fn server_players(&self, server_id: u64) -> Result<Vec<OnlinePlayer>, ApiError> {
        let url = format!("{}/servers/{server_id}", self.config.base_url);
        let query = [("include".to_string(), "player".to_string())];
        let body = self.get_with_retry(&url, &query).await?;
        parse_server_players(&body)
    }

    async fn get_with_retry(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<String, ApiError> {
        let attempts = self.config.retry_attempts;
        let mut last_failure = String::new();

        for attempt in 1..=attempts {
            let result = self
                .http
                .get(url)
                .query(query)
                .bearer_auth(&self.token)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.text().await?);
                }
                Ok(response) => {
                    last_failure = format!("status {}", response.status());
                }
                Err(err) => {
                    last_failure = err.to_string();
                }
            }

            tracing::warn!(url, attempt, attempts, failure = %last_failure, "request failed");
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_backoff).await;
            }
        }

        Err(ApiError::RetriesExhausted {
            url: url.to_string(),
            attempts,
            last_failure,
        })
    }
}

/// Query for the first `/sessions` page.
fn session_query(server_id: u64, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<(String, String)> {
    vec![
        ("filter[servers]".to_string(), server_id.to_string()),
        (
            "filter[range]".to_string(),
            format!(
                "{}:{}",
                start.to_rfc3339_opts(SecondsFormat::Secs, true),
                end.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        ),
        ("page[size]".to_string(), PAGE_SIZE.to_string()),
    ]
}
