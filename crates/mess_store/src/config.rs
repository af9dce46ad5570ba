//! Store configuration.
//!
//! Loaded from a TOML file with [`StoreConfig::load`] or from the process
//! environment (and a `.env` file, if present) with [`StoreConfig::from_env`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Environment variable for the database path.
pub const ENV_DATABASE_PATH: &str = "MESS_STORE_DATABASE_PATH";
/// Environment variable for the pool size.
pub const ENV_MAX_CONNECTIONS: &str = "MESS_STORE_MAX_CONNECTIONS";
/// Environment variable for the busy timeout, in seconds.
pub const ENV_BUSY_TIMEOUT_SECS: &str = "MESS_STORE_BUSY_TIMEOUT_SECS";

/// Connection settings for a [`crate::MessDb`].
///
/// Each database file is an independent namespace; point two configs at two
/// files to run two isolated stores side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mess")
                .join("mess.db"),
            max_connections: 5,
            busy_timeout_secs: 5,
        }
    }
}

impl StoreConfig {
    /// Configuration for a database at `path`, other settings default.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            ..Default::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    /// Load configuration from a TOML file.
    ///
    /// A relative `database_path` is resolved against the file's directory.
    pub async fn load(path: &Path) -> StoreResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::config(path.display().to_string(), e.to_string()))?;

        let mut config: StoreConfig = toml::from_str(&content)
            .map_err(|e| StoreError::config(path.display().to_string(), e.to_string()))?;

        if config.database_path.is_relative() {
            let base_dir = path.parent().unwrap_or(Path::new("."));
            config.database_path = base_dir.join(&config.database_path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Build configuration from environment variables, reading `.env` first.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> StoreResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(value) = lookup(ENV_MAX_CONNECTIONS) {
            config.max_connections = parse_var(ENV_MAX_CONNECTIONS, &value)?;
        }
        if let Some(value) = lookup(ENV_BUSY_TIMEOUT_SECS) {
            config.busy_timeout_secs = parse_var(ENV_BUSY_TIMEOUT_SECS, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check settings the connection pool cannot accept.
    pub fn validate(&self) -> StoreResult<()> {
        if self.max_connections == 0 {
            return Err(StoreError::config(
                "max_connections",
                "max_connections must be at least 1",
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> StoreResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| StoreError::config(key, format!("{value:?}: {e}")))
}
