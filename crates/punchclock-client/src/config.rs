//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so the daemon starts with zero
//! configuration against the public service.

use std::path::PathBuf;
use std::time::Duration;

use punchclock_net::{HttpsConfig, PushConfig};
use punchclock_shared::constants::{DEFAULT_API_URL, DEFAULT_PUSH_URL};
use punchclock_store::Database;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API base URL.
    /// Env: `PUNCHCLOCK_API_URL`
    pub api_url: String,

    /// Realtime push endpoint.
    /// Env: `PUNCHCLOCK_PUSH_URL`
    pub push_url: String,

    /// SQLite database file. `None` uses the platform data directory.
    /// Env: `PUNCHCLOCK_DB_PATH`
    pub db_path: Option<PathBuf>,

    /// Whole-request timeout for REST calls.
    /// Env: `PUNCHCLOCK_HTTP_TIMEOUT_SECS`
    /// Default: 30
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            push_url: DEFAULT_PUSH_URL.to_string(),
            db_path: None,
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("PUNCHCLOCK_API_URL") {
            if url.starts_with("http://") || url.starts_with("https://") {
                config.api_url = url;
            } else {
                tracing::warn!(value = %url, "Invalid PUNCHCLOCK_API_URL, using default");
            }
        }

        if let Some(url) = lookup("PUNCHCLOCK_PUSH_URL") {
            if url.starts_with("ws://") || url.starts_with("wss://") {
                config.push_url = url;
            } else {
                tracing::warn!(value = %url, "Invalid PUNCHCLOCK_PUSH_URL, using default");
            }
        }

        if let Some(path) = lookup("PUNCHCLOCK_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("PUNCHCLOCK_HTTP_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => {
                    tracing::warn!(value = %val, "Invalid PUNCHCLOCK_HTTP_TIMEOUT_SECS, using default");
                }
            }
        }

        config
    }

    pub fn https(&self) -> HttpsConfig {
        HttpsConfig {
            base_url: self.api_url.clone(),
            request_timeout: self.http_timeout,
            ..HttpsConfig::default()
        }
    }

    pub fn push(&self) -> PushConfig {
        PushConfig {
            url: self.push_url.clone(),
            ..PushConfig::default()
        }
    }

    pub fn open_store(&self) -> punchclock_store::Result<Database> {
        match &self.db_path {
            Some(path) => Database::open_at(path),
            None => Database::open_default(),
        }
    }
}
