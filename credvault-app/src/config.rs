//! Store configuration.
//!
//! Values come from a [`ConfigSource`] (environment, in-memory map, a TOML
//! table in the web binary, or a layered stack of those) and are parsed once
//! into a [`StoreConfig`] snapshot. Backend detection only ever looks at that
//! snapshot.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use credvault_core::error::{CoreResult, ValidationErrors};
use credvault_core::RetryPolicy;

/// Prefix for environment lookups: key `database_url` reads `CREDVAULT_DATABASE_URL`.
pub const ENV_PREFIX: &str = "CREDVAULT_";

/// Default location of the embedded database file.
pub const DEFAULT_LOCAL_PATH: &str = "data/credvault.db";

pub mod keys {
    pub const BACKEND: &str = "backend";
    pub const DATABASE_URL: &str = "database_url";
    pub const LOCAL_PATH: &str = "local_path";
    pub const POOL_MAX_CONNECTIONS: &str = "pool_max_connections";
    pub const POOL_MIN_CONNECTIONS: &str = "pool_min_connections";
    pub const POOL_IDLE_TIMEOUT_SECS: &str = "pool_idle_timeout_secs";
    pub const POOL_ACQUIRE_TIMEOUT_SECS: &str = "pool_acquire_timeout_secs";
    pub const SLOW_STATEMENT_MS: &str = "slow_statement_ms";
    pub const RETRY_MAX_ATTEMPTS: &str = "retry_max_attempts";
    pub const RETRY_BASE_DELAY_MS: &str = "retry_base_delay_ms";
    pub const RETRY_MAX_DELAY_MS: &str = "retry_max_delay_ms";
}

/// Key/value configuration lookup.
pub trait ConfigSource: Send + Sync {
    /// Raw value for `key`, `None` when unset.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads `CREDVAULT_<KEY>` environment variables. Empty values count as unset.
#[derive(Debug, Clone, Default)]
pub struct EnvConfigSource;

impl ConfigSource for EnvConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(format!("{ENV_PREFIX}{}", key.to_uppercase()))
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

/// In-memory source, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapConfigSource {
    values: HashMap<String, String>,
}

impl MapConfigSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapConfigSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Stack of sources; the first one with a value wins.
#[derive(Default)]
pub struct LayeredConfigSource {
    layers: Vec<Box<dyn ConfigSource>>,
}

impl LayeredConfigSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer below the existing ones.
    #[must_use]
    pub fn layer(mut self, source: impl ConfigSource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl ConfigSource for LayeredConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}

/// Storage backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Embedded `SQLite` file
    Local,
    /// Pooled Postgres server
    Remote,
}

impl BackendKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "sqlite" => Ok(Self::Local),
            "remote" | "postgres" | "postgresql" => Ok(Self::Remote),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

/// Remote pool bounds and statement timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
    /// Statements slower than this are logged at `warn`.
    pub slow_statement_threshold: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(5),
            slow_statement_threshold: Duration::from_millis(200),
        }
    }
}

/// Parsed configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Explicit backend choice; overrides detection.
    pub backend: Option<BackendKind>,
    pub database_url: Option<String>,
    pub local_path: PathBuf,
    pub pool: PoolConfig,
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: None,
            database_url: None,
            local_path: PathBuf::from(DEFAULT_LOCAL_PATH),
            pool: PoolConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Local-only configuration at `path`.
    #[must_use]
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Some(BackendKind::Local),
            local_path: path.into(),
            ..Self::default()
        }
    }

    /// Parse a snapshot from `source`. Every malformed key is reported at once.
    pub fn from_source(source: &dyn ConfigSource) -> CoreResult<Self> {
        let defaults = Self::default();
        let mut errors = ValidationErrors::new();

        let backend = match source.get(keys::BACKEND) {
            None => None,
            Some(v) if v.trim().eq_ignore_ascii_case("auto") => None,
            Some(v) => match v.parse::<BackendKind>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    errors.push(keys::BACKEND, e);
                    None
                }
            },
        };

        let mut parse = |key: &str, default: u64| -> u64 {
            match source.get(key) {
                None => default,
                Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                    errors.push(key, format!("expected a non-negative integer, got '{raw}'"));
                    default
                }),
            }
        };

        let to_u32 = |v: u64| u32::try_from(v).unwrap_or(u32::MAX);
        let pool = PoolConfig {
            max_connections: to_u32(parse(
                keys::POOL_MAX_CONNECTIONS,
                u64::from(defaults.pool.max_connections),
            )),
            min_connections: to_u32(parse(
                keys::POOL_MIN_CONNECTIONS,
                u64::from(defaults.pool.min_connections),
            )),
            idle_timeout: Duration::from_secs(parse(
                keys::POOL_IDLE_TIMEOUT_SECS,
                defaults.pool.idle_timeout.as_secs(),
            )),
            acquire_timeout: Duration::from_secs(parse(
                keys::POOL_ACQUIRE_TIMEOUT_SECS,
                defaults.pool.acquire_timeout.as_secs(),
            )),
            slow_statement_threshold: Duration::from_millis(parse(
                keys::SLOW_STATEMENT_MS,
                duration_ms(defaults.pool.slow_statement_threshold),
            )),
        };
        let retry = RetryPolicy {
            max_attempts: to_u32(parse(
                keys::RETRY_MAX_ATTEMPTS,
                u64::from(defaults.retry.max_attempts),
            )),
            base_delay: Duration::from_millis(parse(
                keys::RETRY_BASE_DELAY_MS,
                duration_ms(defaults.retry.base_delay),
            )),
            max_delay: Duration::from_millis(parse(
                keys::RETRY_MAX_DELAY_MS,
                duration_ms(defaults.retry.max_delay),
            )),
        };

        if pool.max_connections == 0 {
            errors.push(keys::POOL_MAX_CONNECTIONS, "must be at least 1");
        }
        if pool.min_connections > pool.max_connections {
            errors.push(
                keys::POOL_MIN_CONNECTIONS,
                "must not exceed pool_max_connections",
            );
        }
        if retry.max_attempts == 0 {
            errors.push(keys::RETRY_MAX_ATTEMPTS, "must be at least 1");
        }

        errors.into_result()?;

        Ok(Self {
            backend,
            database_url: source.get(keys::DATABASE_URL).map(|v| v.trim().to_string()),
            local_path: source
                .get(keys::LOCAL_PATH)
                .map_or(defaults.local_path, PathBuf::from),
            pool,
            retry,
        })
    }

    /// The configured connection string, if it is a usable Postgres URL.
    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .filter(|url| is_valid_remote_url(url))
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// `postgres://` or `postgresql://` URL with a host.
#[must_use]
pub fn is_valid_remote_url(raw: &str) -> bool {
    url::Url::parse(raw).is_ok_and(|u| {
        matches!(u.scheme(), "postgres" | "postgresql") && u.host_str().is_some_and(|h| !h.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use credvault_core::CoreError;

    #[test]
    fn defaults_when_source_is_empty() {
        let config = StoreConfig::from_source(&MapConfigSource::new()).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn parses_every_key() {
        let source: MapConfigSource = [
            ("backend", "remote"),
            ("database_url", "postgres://u:p@db:5432/vault"),
            ("local_path", "/tmp/v.db"),
            ("pool_max_connections", "20"),
            ("pool_min_connections", "2"),
            ("pool_idle_timeout_secs", "30"),
            ("pool_acquire_timeout_secs", "3"),
            ("slow_statement_ms", "50"),
            ("retry_max_attempts", "5"),
            ("retry_base_delay_ms", "10"),
            ("retry_max_delay_ms", "1000"),
        ]
        .into_iter()
        .collect();

        let config = StoreConfig::from_source(&source).unwrap();
        assert_eq!(config.backend, Some(BackendKind::Remote));
        assert_eq!(config.remote_url(), Some("postgres://u:p@db:5432/vault"));
        assert_eq!(config.local_path, PathBuf::from("/tmp/v.db"));
        assert_eq!(config.pool.max_connections, 20);
        assert_eq!(config.pool.min_connections, 2);
        assert_eq!(config.pool.idle_timeout, Duration::from_secs(30));
        assert_eq!(config.pool.acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.pool.slow_statement_threshold, Duration::from_millis(50));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(10));
        assert_eq!(config.retry.max_delay, Duration::from_secs(1));
    }

    #[test]
    fn invalid_numbers_name_their_keys() {
        let source = MapConfigSource::new()
            .with("pool_max_connections", "lots")
            .with("retry_base_delay_ms", "-1")
            .with("backend", "cloud");

        let Err(CoreError::Validation(errors)) = StoreConfig::from_source(&source) else {
            panic!("expected validation error");
        };
        assert!(errors.contains("pool_max_connections"));
        assert!(errors.contains("retry_base_delay_ms"));
        assert!(errors.contains("backend"));
    }

    #[test]
    fn min_connections_cannot_exceed_max() {
        let source = MapConfigSource::new()
            .with("pool_max_connections", "2")
            .with("pool_min_connections", "5");
        assert!(StoreConfig::from_source(&source).is_err());
    }

    #[test]
    fn remote_url_requires_postgres_scheme_and_host() {
        assert!(is_valid_remote_url("postgresql://localhost/vault"));
        assert!(!is_valid_remote_url("mysql://localhost/vault"));
        assert!(!is_valid_remote_url("not a url"));
        assert!(!is_valid_remote_url("postgres:///vault"));
    }

    #[test]
    fn layered_source_prefers_earlier_layers() {
        let source = LayeredConfigSource::new()
            .layer(MapConfigSource::new().with("backend", "local"))
            .layer(
                MapConfigSource::new()
                    .with("backend", "remote")
                    .with("local_path", "x.db"),
            );
        assert_eq!(source.get("backend").as_deref(), Some("local"));
        assert_eq!(source.get("local_path").as_deref(), Some("x.db"));
        assert_eq!(source.get("database_url"), None);
    }

    #[test]
    fn auto_backend_means_detect() {
        let source = MapConfigSource::new().with("backend", "auto");
        assert_eq!(StoreConfig::from_source(&source).unwrap().backend, None);
    }
}
