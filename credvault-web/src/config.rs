//! Server configuration file
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//! workers = 4
//! environment = "production"
//!
//! [log]
//! level = "info"
//! format = "json"
//! directory = "logs"
//!
//! [store]
//! database_url = "postgres://vault:secret@db/vault"
//! pool_max_connections = 20
//! ```
//!
//! The `[store]` table is handed to the store configuration as a
//! [`ConfigSource`]; `CREDVAULT_*` environment variables take precedence.

use std::path::{Path, PathBuf};

use anyhow::Context;
use credvault_app::{ConfigSource, EnvConfigSource, LayeredConfigSource, StoreConfig};
use credvault_core::CoreResult;
use serde::Deserialize;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CREDVAULT_CONFIG";
/// Looked up in the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "credvault.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub store: toml::Table,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub workers: usize,
    /// `production` hides error detail from response bodies.
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            workers: num_cpus::get(),
            environment: "production".to_string(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    pub level: String,
    pub format: LogFormat,
    /// Daily-rolling log files are written here when set.
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
        }
    }
}

impl WebConfig {
    /// Parse a TOML document.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid configuration file")
    }

    /// Read and parse `path`.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content)
    }

    /// Explicit path (CLI argument), then `CREDVAULT_CONFIG`, then
    /// `credvault.toml` if present. Defaults otherwise.
    pub fn load(explicit: Option<PathBuf>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = explicit
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(|| {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                fallback.exists().then_some(fallback)
            });

        match path {
            Some(path) => Ok((Self::from_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Store configuration: environment over the `[store]` table.
    pub fn store_config(&self) -> CoreResult<StoreConfig> {
        let source = LayeredConfigSource::new()
            .layer(EnvConfigSource)
            .layer(TomlConfigSource::new(self.store.clone()));
        StoreConfig::from_source(&source)
    }
}

/// [`ConfigSource`] over a TOML table. Scalars are rendered as strings.
#[derive(Debug, Clone, Default)]
pub struct TomlConfigSource {
    table: toml::Table,
}

impl TomlConfigSource {
    #[must_use]
    pub fn new(table: toml::Table) -> Self {
        Self { table }
    }
}

impl ConfigSource for TomlConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        match self.table.get(key)? {
            toml::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
