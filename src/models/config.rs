//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client behavior settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Collector and refresh behavior settings
    #[serde(default)]
    pub collector: CollectorConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.client.user_agent.trim().is_empty() {
            return Err(AppError::config("client.user_agent is empty"));
        }
        if self.client.timeout_secs == 0 {
            return Err(AppError::config("client.timeout_secs must be > 0"));
        }
        if self.collector.refresh_interval_secs == 0 {
            return Err(AppError::config(
                "collector.refresh_interval_secs must be > 0",
            ));
        }
        if self.collector.source_types.is_empty() && self.collector.sources.is_empty() {
            return Err(AppError::config(
                "at least one of collector.source_types or collector.sources is required",
            ));
        }
        Ok(())
    }
}

/// HTTP client settings shared by all built-in sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Collector construction and refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Minimum interval between refreshes of one source, in seconds
    #[serde(default = "defaults::refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Upper bound on one source fetch, in seconds (0 disables the bound)
    #[serde(default)]
    pub fetch_timeout_secs: u64,

    /// Source type groups to collect (http, https, socks4, socks5, ...)
    #[serde(default = "defaults::source_types")]
    pub source_types: Vec<String>,

    /// Individual sources to collect, in addition to any type groups
    #[serde(default)]
    pub sources: Vec<String>,
}

impl CollectorConfig {
    /// Refresh interval as a [`Duration`].
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Fetch timeout as a [`Duration`], if one is configured.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: defaults::refresh_interval(),
            fetch_timeout_secs: 0,
            source_types: defaults::source_types(),
            sources: Vec::new(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; proxypool/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn refresh_interval() -> u64 {
        3600
    }
    pub fn source_types() -> Vec<String> {
        vec!["http".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.client.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_refresh_interval() {
        let mut config = Config::default();
        config.collector.refresh_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_nothing_to_collect() {
        let mut config = Config::default();
        config.collector.source_types.clear();
        config.collector.sources.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn fetch_timeout_zero_means_none() {
        let config = CollectorConfig::default();
        assert!(config.fetch_timeout().is_none());

        let config = CollectorConfig {
            fetch_timeout_secs: 15,
            ..CollectorConfig::default()
        };
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[client]
timeout_secs = 10

[collector]
refresh_interval_secs = 600
source_types = ["socks4", "socks5"]
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.client.timeout_secs, 10);
        assert_eq!(config.collector.refresh_interval_secs, 600);
        assert_eq!(config.collector.source_types, vec!["socks4", "socks5"]);
        // Unspecified fields fall back to defaults
        assert!(!config.client.user_agent.is_empty());
        assert!(config.validate().is_ok());
    }
}
