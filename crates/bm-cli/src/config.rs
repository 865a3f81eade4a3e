//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bm_api::{ClientConfig, DEFAULT_BASE_URL};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the BattleMetrics API.
    pub api_url: String,

    /// Bearer token. Prefer `token_path` so the secret stays out of config files.
    pub token: Option<String>,

    /// File holding the bearer token.
    pub token_path: Option<PathBuf>,

    /// Attempts per API request, including the first.
    pub retry_attempts: u32,

    /// Pause between attempts, in milliseconds.
    pub retry_backoff_ms: u64,

    pub request_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_path", &self.token_path)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            token_path: None,
            retry_attempts: 5,
            retry_backoff_ms: 200,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads configuration from default locations, optionally merging a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (BM_*)
        figment = figment.merge(Env::prefixed("BM_"));

        figment.extract()
    }

    /// Connection settings for the API client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            retry_attempts: self.retry_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Returns the platform-specific config directory for bm.
///
/// On Linux: `~/.config/bm`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bm"))
}
