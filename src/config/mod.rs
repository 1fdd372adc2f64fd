//! Configuration management.
//!
//! Settings come from an optional TOML file layered with environment
//! variables prefixed `ACADEMIC_PAPERS__` (e.g. `ACADEMIC_PAPERS__CACHE__HOST`).
//! Without a file, [`get_config`] reads the legacy deployment variables:
//! `CORE_API_KEY`, `REDIS_HOST`, `REDIS_PORT`,
//! `REDIS_PASSWORD` and `REDIS_DB`.
//!
//! ```toml
//! [api]
//! core_api_key = "your-core-api-key"
//! base_url = "https://api.core.ac.uk/v3/search/works/"
//! timeout_seconds = 10
//!
//! [cache]
//! enabled = true
//! backend = "redis"
//! host = "localhost"
//! port = 6379
//! db = 0
//! ttl_seconds = 86400
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::{CORE_SEARCH_URL, USER_AGENT};
use crate::utils::validate_url;

/// File name searched for by [`find_config_file`]
pub const CONFIG_FILE_NAME: &str = "academic-papers-search.toml";

/// Environment prefix for layered overrides
pub const ENV_PREFIX: &str = "ACADEMIC_PAPERS";

/// Longest accepted upstream request timeout
pub const MAX_TIMEOUT_SECONDS: u64 = 60 * 60;

/// Longest accepted cache entry lifetime
pub const MAX_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Startup configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Defaults overlaid with the legacy environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(key) = lookup("CORE_API_KEY").filter(|k| !k.is_empty()) {
            config.api.core_api_key = Some(key);
        }
        if let Some(host) = lookup("REDIS_HOST").filter(|h| !h.is_empty()) {
            config.cache.host = host;
        }
        if let Some(port) = lookup("REDIS_PORT").filter(|p| !p.is_empty()) {
            config.cache.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("REDIS_PORT is not a port: {}", port)))?;
        }
        if let Some(password) = lookup("REDIS_PASSWORD").filter(|p| !p.is_empty()) {
            config.cache.password = Some(password);
        }
        if let Some(db) = lookup("REDIS_DB").filter(|d| !d.is_empty()) {
            config.cache.db = db
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("REDIS_DB is not an integer: {}", db)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.api.base_url)
            .map_err(|e| ConfigError::Invalid(format!("api.base_url: {}", e)))?;

        if !(1..=MAX_TIMEOUT_SECONDS).contains(&self.api.timeout_seconds) {
            return Err(ConfigError::Invalid(format!(
                "api.timeout_seconds must be between 1 and {}",
                MAX_TIMEOUT_SECONDS
            )));
        }
        if self.cache.enabled && !(1..=MAX_TTL_SECONDS).contains(&self.cache.ttl_seconds) {
            return Err(ConfigError::Invalid(format!(
                "cache.ttl_seconds must be between 1 and {}",
                MAX_TTL_SECONDS
            )));
        }
        Ok(())
    }
}

/// Upstream API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// CORE API key, sent as a bearer token
    #[serde(default)]
    pub core_api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            core_api_key: None,
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_base_url() -> String {
    CORE_SEARCH_URL.to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    USER_AGENT.to_string()
}

/// Cache backing store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: CacheBackend,

    #[serde(default = "default_redis_host")]
    pub host: String,

    #[serde(default = "default_redis_port")]
    pub port: u16,

    #[serde(default)]
    pub password: Option<String>,

    /// Redis logical database index
    #[serde(default)]
    pub db: i64,

    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,

    /// Bound on each store round trip, including the initial connect
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::default(),
            host: default_redis_host(),
            port: default_redis_port(),
            password: None,
            db: 0,
            ttl_seconds: default_ttl(),
            operation_timeout_ms: default_operation_timeout(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// `redis://[:password@]host:port/db`
    pub fn redis_url(&self) -> String {
        let auth = self
            .password
            .as_deref()
            .map(|p| format!(":{}@", urlencoding::encode(p)))
            .unwrap_or_default();
        format!("redis://{}{}:{}/{}", auth, self.host, self.port, self.db)
    }
}

fn default_true() -> bool {
    true
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_ttl() -> u64 {
    86_400 // 24 hours
}

fn default_operation_timeout() -> u64 {
    2_000
}

/// Load configuration from a file, with `ACADEMIC_PAPERS__*` overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::from(path))
        .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Result<Config, ConfigError> {
    Config::from_env()
}

/// Look for a config file in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("academic-papers-search").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, CORE_SEARCH_URL);
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.api.user_agent, "Academic Papers Search");
        assert!(config.cache.enabled);
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.ttl(), Duration::from_secs(24 * 60 * 60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_legacy_env_vars() {
        let config = Config::from_lookup(lookup_from(&[
            ("CORE_API_KEY", "core-key"),
            ("REDIS_HOST", "cache.internal"),
            ("REDIS_PORT", "6380"),
            ("REDIS_PASSWORD", "p@ss"),
            ("REDIS_DB", "3"),
        ]))
        .unwrap();

        assert_eq!(config.api.core_api_key.as_deref(), Some("core-key"));
        assert_eq!(config.cache.host, "cache.internal");
        assert_eq!(config.cache.port, 6380);
        assert_eq!(config.cache.db, 3);
        assert_eq!(
            config.cache.redis_url(),
            "redis://:p%40ss@cache.internal:6380/3"
        );
    }

    #[test]
    fn test_non_numeric_redis_db_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[("REDIS_DB", "zero")]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_redis_url_without_password() {
        let config = CacheConfig::default();
        assert_eq!(config.redis_url(), "redis://localhost:6379/0");
    }

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(
            &path,
            r#"
[api]
core_api_key = "file-key"
timeout_seconds = 5

[cache]
backend = "memory"
ttl_seconds = 60
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.api.core_api_key.as_deref(), Some("file-key"));
        assert_eq!(config.api.timeout(), Duration::from_secs(5));
        assert_eq!(config.api.base_url, CORE_SEARCH_URL);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.cache.port, 6379);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = \"ftp://example.com\"\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_out_of_range_durations_are_rejected() {
        let mut config = Config::default();
        config.cache.ttl_seconds = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.cache.ttl_seconds = MAX_TTL_SECONDS;
        assert!(config.validate().is_ok());

        config.api.timeout_seconds = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.api.timeout_seconds = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_huge_ttl_in_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[cache]\nbackend = \"memory\"\nttl_seconds = 9223372036854775807\n",
        )
        .unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_file_nonexistent() {
        let path = PathBuf::from("/nonexistent/config.toml");
        assert!(matches!(load_config(&path), Err(ConfigError::Load(_))));
    }
}
