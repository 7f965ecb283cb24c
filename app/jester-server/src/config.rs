//! TOML configuration of the server and its upstreams.
//!
//! ```toml
//! [server]
//! addr = "0.0.0.0:5000"
//! request_timeout = 30000
//!
//! [clients.joke_service]
//! name = "jokes"
//! base_url = "http://api.icndb.com"
//! timeout = 5000
//! categories = ["nerdy"]
//!
//! [clients.name_service]
//! name = "names"
//! base_url = "http://uinames.com/api/"
//! timeout = 5000
//!
//! [retry]
//! max_attempts = 3
//! initial_backoff = 1000
//! max_backoff = 10000
//! ```
//!
//! Durations are milliseconds. `[server]`, `[retry]`, `timeout` and
//! `categories` are optional.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jester::{ClientConfig, RetryPolicy};
use serde::Deserialize;

use crate::{Error, Result};

/// Config file used when `JESTER_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = ".configs/config.toml";

/// Environment variable overriding the config file path.
pub const CONFIG_ENV: &str = "JESTER_CONFIG";

/// Whole configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream services.
    pub clients: Clients,
    /// Retry settings shared by both upstreams.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    /// Deadline of one inbound request, in milliseconds.
    pub request_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            request_timeout: 30_000,
        }
    }
}

/// `[clients]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct Clients {
    /// Joke service.
    pub joke_service: ServiceConfig,
    /// Name service.
    pub name_service: ServiceConfig,
}

/// One upstream service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Logical name.
    pub name: String,
    /// Base URL.
    pub base_url: String,
    /// Per-attempt timeout, in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Joke categories; only read for the joke service.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

const fn default_timeout() -> u64 {
    5_000
}

/// `[retry]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    /// First backoff delay, in milliseconds.
    pub initial_backoff: u64,
    /// Largest backoff delay, in milliseconds.
    pub max_backoff: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_backoff: millis(policy.initial_backoff),
            max_backoff: millis(policy.max_backoff),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl RetryConfig {
    /// Retry policy for the REST clients.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff),
            max_backoff: Duration::from_millis(self.max_backoff),
            ..RetryPolicy::default()
        }
    }
}

impl ServiceConfig {
    /// Client configuration for this service.
    #[must_use]
    pub fn client_config(&self, retry: &RetryConfig) -> ClientConfig {
        ClientConfig::builder()
            .name(self.name.as_str())
            .base_url(self.base_url.as_str())
            .timeout(Duration::from_millis(self.timeout))
            .retry(retry.policy())
            .build()
    }

    fn validate(&self, section: &str) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig(format!("{section}.name is empty")));
        }
        if self.base_url.trim().is_empty() {
            return Err(Error::InvalidConfig(format!("{section}.base_url is empty")));
        }
        if self.timeout == 0 {
            return Err(Error::InvalidConfig(format!("{section}.timeout must be positive")));
        }
        if self.categories.as_ref().is_some_and(Vec::is_empty) {
            return Err(Error::InvalidConfig(format!(
                "{section}.categories must not be empty"
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseConfig`] for malformed TOML and
    /// [`Error::InvalidConfig`] for unusable values.
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the file at `path`.
    ///
    /// # Errors
    ///
    /// See [`Config::from_toml`]; also [`Error::ReadConfig`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// Path named by `JESTER_CONFIG`, or the default path.
    #[must_use]
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
    }

    /// Deadline of one inbound request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout)
    }

    /// Categories the generator limits jokes to, if configured.
    #[must_use]
    pub fn joke_categories(&self) -> Option<&[String]> {
        self.clients.joke_service.categories.as_deref()
    }

    fn validate(&self) -> Result<()> {
        self.clients.joke_service.validate("clients.joke_service")?;
        self.clients.name_service.validate("clients.name_service")?;
        if self.server.request_timeout == 0 {
            return Err(Error::InvalidConfig(
                "server.request_timeout must be positive".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [clients.joke_service]
        name = "jokes"
        base_url = "http://api.icndb.com"

        [clients.name_service]
        name = "names"
        base_url = "http://uinames.com/api/"
        timeout = 2500
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_toml(MINIMAL).expect("valid");

        assert_eq!(config.server.addr, SocketAddr::from(([0, 0, 0, 0], 5000)));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.clients.joke_service.timeout, 5_000);
        assert_eq!(config.joke_categories(), None);
        assert_eq!(config.retry.policy(), RetryPolicy::default());
    }

    #[test]
    fn service_section_converts_to_client_config() {
        let config = Config::from_toml(MINIMAL).expect("valid");
        let client = config.clients.name_service.client_config(&config.retry);

        assert_eq!(client.name, "names");
        assert_eq!(client.base_url, "http://uinames.com/api/");
        assert_eq!(client.timeout, Duration::from_millis(2500));
        assert_eq!(client.retry.attempts(), 3);
    }

    #[test]
    fn full_config() {
        let config = Config::from_toml(
            r#"
            [server]
            addr = "127.0.0.1:8080"
            request_timeout = 1000

            [clients.joke_service]
            name = "jokes"
            base_url = "http://api.icndb.com"
            categories = ["nerdy", "explicit"]

            [clients.name_service]
            name = "names"
            base_url = "http://uinames.com/api/"

            [retry]
            max_attempts = 5
            initial_backoff = 10
            "#,
        )
        .expect("valid");

        assert_eq!(config.server.addr.port(), 8080);
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
        assert_eq!(
            config.joke_categories(),
            Some(&["nerdy".to_string(), "explicit".to_string()][..])
        );

        let policy = config.retry.policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(10));
        assert_eq!(policy.max_backoff, Duration::from_secs(10));
    }

    #[test]
    fn missing_client_section_is_parse_error() {
        let err = Config::from_toml("[clients.joke_service]\nname = \"jokes\"\nbase_url = \"x\"")
            .expect_err("name_service missing");
        assert!(matches!(err, Error::ParseConfig(_)), "{err}");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let source = MINIMAL.replace("timeout = 2500", "timeout = 0");
        let err = Config::from_toml(&source).expect_err("zero timeout");
        assert_eq!(
            err.to_string(),
            "invalid config: clients.name_service.timeout must be positive"
        );

        let source = format!("{MINIMAL}\n[retry]\nmax_attempts = 0\n");
        let err = Config::from_toml(&source).expect_err("zero attempts");
        assert!(matches!(err, Error::InvalidConfig(_)));

        let source = MINIMAL.replace(
            "base_url = \"http://api.icndb.com\"",
            "base_url = \"http://api.icndb.com\"\ncategories = []",
        );
        let err = Config::from_toml(&source).expect_err("empty categories");
        assert!(err.to_string().contains("categories"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("/definitely/not/here.toml").expect_err("missing");
        assert!(matches!(err, Error::ReadConfig { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
