//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default API server for all request descriptors.
pub const DEFAULT_API_SERVER: &str = "https://api.medium.com";

/// Configuration for the API client and its dispatcher lanes.
///
/// Typically loaded from a `feedkit.toml` file or from the environment.
///
/// # Example Configuration File
///
/// ```toml
/// api_server = "https://api.medium.com"
/// request_timeout_ms = 15000
/// foreground_concurrency = 4
/// background_concurrency = 1
/// log_filter = "feedkit=debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every request is resolved against.
    #[serde(default = "default_api_server")]
    pub api_server: String,

    /// Per-request timeout in milliseconds, applied by the HTTP transport.
    #[serde(default = "default_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum number of pipelines running at once on the foreground lane.
    #[serde(default = "default_foreground_concurrency")]
    pub foreground_concurrency: usize,

    /// Maximum number of pipelines running at once on the background lane.
    #[serde(default = "default_background_concurrency")]
    pub background_concurrency: usize,

    /// `User-Agent` header sent by the HTTP transport.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_api_server() -> String {
    DEFAULT_API_SERVER.to_string()
}

fn default_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_foreground_concurrency() -> usize {
    4
}

fn default_background_concurrency() -> usize {
    1
}

fn default_user_agent() -> String {
    concat!("feedkit/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_log_filter() -> String {
    "feedkit=info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_server: default_api_server(),
            request_timeout_ms: default_timeout(),
            foreground_concurrency: default_foreground_concurrency(),
            background_concurrency: default_background_concurrency(),
            user_agent: default_user_agent(),
            log_filter: default_log_filter(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = ClientConfig::from_file("feedkit.toml")?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    ///
    /// - `FEEDKIT_API_SERVER`
    /// - `FEEDKIT_REQUEST_TIMEOUT_MS`
    /// - `FEEDKIT_FOREGROUND_CONCURRENCY`
    /// - `FEEDKIT_BACKGROUND_CONCURRENCY`
    /// - `FEEDKIT_USER_AGENT`
    /// - `FEEDKIT_LOG_FILTER`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(server) = lookup("FEEDKIT_API_SERVER") {
            config.api_server = server;
        }
        if let Some(ms) = lookup("FEEDKIT_REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            config.request_timeout_ms = ms;
        }
        if let Some(n) = lookup("FEEDKIT_FOREGROUND_CONCURRENCY").and_then(|v| v.parse().ok()) {
            config.foreground_concurrency = n;
        }
        if let Some(n) = lookup("FEEDKIT_BACKGROUND_CONCURRENCY").and_then(|v| v.parse().ok()) {
            config.background_concurrency = n;
        }
        if let Some(agent) = lookup("FEEDKIT_USER_AGENT") {
            config.user_agent = agent;
        }
        if let Some(filter) = lookup("FEEDKIT_LOG_FILTER") {
            config.log_filter = filter;
        }

        config
    }

    /// Check that the configuration is usable.
    ///
    /// The API server must be an absolute URL that can carry a path, and
    /// the timeout must be non-zero.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api_server)
            .map_err(|e| Error::config(format!("invalid api_server {}: {}", self.api_server, e)))?;
        if url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "api_server {} cannot be used as a base URL",
                self.api_server
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::config("request_timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    /// The request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Set the API server.
    pub fn with_api_server(mut self, api_server: impl Into<String>) -> Self {
        self.api_server = api_server.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Set the concurrency of both dispatcher lanes.
    pub fn with_concurrency(mut self, foreground: usize, background: usize) -> Self {
        self.foreground_concurrency = foreground;
        self.background_concurrency = background;
        self
    }

    /// Set the `User-Agent` header value.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_server, "https://api.medium.com");
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.foreground_concurrency, 4);
        assert_eq!(config.background_concurrency, 1);
        assert!(config.user_agent.starts_with("feedkit/"));
        assert_eq!(config.log_filter, "feedkit=info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config = ClientConfig::from_toml(
            r#"
            api_server = "http://localhost:9000"
            request_timeout_ms = 5000
            background_concurrency = 2
        "#,
        )
        .unwrap();

        assert_eq!(config.api_server, "http://localhost:9000");
        assert_eq!(config.request_timeout(), Duration::from_millis(5000));
        assert_eq!(config.foreground_concurrency, 4);
        assert_eq!(config.background_concurrency, 2);
    }

    #[test]
    fn test_parse_toml_rejects_bad_server() {
        let err = ClientConfig::from_toml(r#"api_server = "not a url""#).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);

        let err = ClientConfig::from_toml(r#"api_server = "mailto:someone@example.com""#)
            .unwrap_err();
        assert!(err.to_string().contains("base URL"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ClientConfig::default().with_timeout(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ClientConfig::default()
            .with_api_server("http://127.0.0.1:8080")
            .with_concurrency(8, 2);
        let toml = config.to_toml().unwrap();
        let parsed = ClientConfig::from_toml(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("FEEDKIT_API_SERVER", "http://staging.local"),
            ("FEEDKIT_REQUEST_TIMEOUT_MS", "1500"),
            ("FEEDKIT_FOREGROUND_CONCURRENCY", "not-a-number"),
            ("FEEDKIT_BACKGROUND_CONCURRENCY", "3"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_server, "http://staging.local");
        assert_eq!(config.request_timeout_ms, 1500);
        assert_eq!(config.foreground_concurrency, 4);
        assert_eq!(config.background_concurrency, 3);
        assert_eq!(config.log_filter, "feedkit=info");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedkit.toml");
        std::fs::write(&path, "foreground_concurrency = 6\n").unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.foreground_concurrency, 6);

        let missing = ClientConfig::from_file(dir.path().join("missing.toml"));
        assert!(missing.is_err());
    }
}
