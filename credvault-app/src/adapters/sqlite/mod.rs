//! Local backend: an embedded `SQLite` file opened through `SeaORM`.
//!
//! Every repository call runs inside its own transaction. `SQLite` serializes
//! writers itself; a busy or locked database surfaces as a transient
//! database error and is left to the retry decorator.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use credvault_core::error::{CoreError, CoreResult};
use credvault_core::traits::CredentialRepository;
use credvault_core::types::{
    CredentialPatch, CredentialRecord, CredentialStats, ListQuery, NewCredential,
    PaginatedResponse,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use super::db_error::{classify, StoreOrigin};
use super::migration::Migrator;
use super::records;

const ORIGIN: StoreOrigin = StoreOrigin::Local;

/// `SQLite`-backed credential repository.
pub struct SqliteStore {
    db: DatabaseConnection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and bring the schema up to date.
    ///
    /// # Errors
    /// Returns `CoreError::Database` if directory creation, connection, or
    /// schema migration fails.
    pub async fn open(db_path: &Path) -> CoreResult<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::database(format!("Failed to create directory: {e}"), false)
            })?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let mut options = ConnectOptions::new(db_url);
        options
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Trace);

        let db = Database::connect(options)
            .await
            .map_err(|e| classify(&e, ORIGIN))?;

        Migrator::up(&db, None)
            .await
            .map_err(|e| classify(&e, ORIGIN))?;

        log::info!("SQLite store opened at {}", db_path.display());
        Ok(Self {
            db,
            path: db_path.to_path_buf(),
        })
    }

    /// Database file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of applied schema migrations.
    pub async fn schema_version(&self) -> CoreResult<u32> {
        let applied = Migrator::get_applied_migrations(&self.db)
            .await
            .map_err(|e| classify(&e, ORIGIN))?;
        Ok(u32::try_from(applied.len()).unwrap_or(u32::MAX))
    }

    /// Close the underlying connection pool.
    pub async fn close(self) -> CoreResult<()> {
        self.db.close().await.map_err(|e| classify(&e, ORIGIN))
    }
}

#[async_trait]
impl CredentialRepository for SqliteStore {
    async fn list(&self, query: &ListQuery) -> CoreResult<PaginatedResponse<CredentialRecord>> {
        let txn = records::begin(&self.db, ORIGIN).await?;
        let result = records::list(&txn, query, ORIGIN).await;
        records::finish(txn, result, ORIGIN).await
    }

    async fn get_by_id(&self, id: &str) -> CoreResult<CredentialRecord> {
        let txn = records::begin(&self.db, ORIGIN).await?;
        let result = records::get_by_id(&txn, id, ORIGIN).await;
        records::finish(txn, result, ORIGIN).await
    }

    async fn create(&self, data: &NewCredential) -> CoreResult<CredentialRecord> {
        let txn = records::begin(&self.db, ORIGIN).await?;
        let result = records::create(&txn, data, ORIGIN).await;
        records::finish(txn, result, ORIGIN).await
    }

    async fn update(&self, id: &str, patch: &CredentialPatch) -> CoreResult<CredentialRecord> {
        let txn = records::begin(&self.db, ORIGIN).await?;
        let result = records::update(&txn, id, patch, ORIGIN).await;
        records::finish(txn, result, ORIGIN).await
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        let txn = records::begin(&self.db, ORIGIN).await?;
        let result = records::delete(&txn, id, ORIGIN).await;
        records::finish(txn, result, ORIGIN).await
    }

    async fn stats(&self, window_days: u32) -> CoreResult<CredentialStats> {
        let txn = records::begin(&self.db, ORIGIN).await?;
        let result = records::stats(&txn, window_days, ORIGIN).await;
        records::finish(txn, result, ORIGIN).await
    }
}
