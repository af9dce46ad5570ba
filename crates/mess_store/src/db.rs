//! Database connection and maintenance for the mess store.

use std::path::Path;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::format::serialize_timestamp;

/// Store database handle.
///
/// Manages the SQLite connection pool for the site database, which stores:
/// - Users, provider accounts, sessions and verification tokens
/// - The visitor counter
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct MessDb {
    pool: SqlitePool,
}

impl MessDb {
    /// Open or create a database at the given path with default settings.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::connect(&StoreConfig::at(path.as_ref())).await
    }

    /// Open or create the database described by `config`.
    ///
    /// The file and its directory are created on first use and pending
    /// migrations applied. Connections run in WAL mode with foreign keys on.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let path = config.database_path.as_path();

        if let Some(parent) = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty() && !p.exists())
        {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening mess database at {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout())
            .pragma("synchronous", "NORMAL")
            .pragma("temp_store", "MEMORY")
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        debug!(
            "Pool ready with up to {} connections",
            config.max_connections
        );

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// A private in-memory database with migrations applied.
    ///
    /// Limited to one connection, since each SQLite connection to `:memory:`
    /// gets its own database.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .journal_mode(SqliteJournalMode::Wal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool. Migrations are not run.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Identity schema is up to date");
        Ok(())
    }

    /// The underlying pool, for queries outside [`crate::queries`].
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Round-trip a trivial statement.
    pub async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Delete sessions whose expiry has passed.
    pub async fn cleanup_expired_sessions(&self) -> StoreResult<u64> {
        let now = serialize_timestamp("expires", Utc::now())?;
        let result = sqlx::query("DELETE FROM sessions WHERE expires < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            debug!("Cleaned up {} expired sessions", deleted);
        }
        Ok(deleted)
    }

    /// Delete verification tokens whose expiry has passed.
    ///
    /// Tokens are normally consumed by sign-in; this removes the ones that
    /// never were.
    pub async fn cleanup_expired_verification_tokens(&self) -> StoreResult<u64> {
        let now = serialize_timestamp("expires", Utc::now())?;
        let result = sqlx::query("DELETE FROM verification_tokens WHERE expires < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            debug!("Cleaned up {} expired verification tokens", deleted);
        }
        Ok(deleted)
    }
}
