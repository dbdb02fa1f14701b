//! Remote backend: Postgres reached through a bounded `SeaORM`/`sqlx` pool.
//!
//! Each logical operation borrows one pooled connection for the lifetime of
//! its transaction. Statements are timed; anything slower than the configured
//! threshold is logged as a slow statement.

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use credvault_core::error::CoreResult;
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
use crate::config::PoolConfig;

const ORIGIN: StoreOrigin = StoreOrigin::Remote;

/// Postgres-backed credential repository.
pub struct PostgresStore {
    db: DatabaseConnection,
    pool: PoolConfig,
}

impl PostgresStore {
    /// Connect with a bounded pool and run pending migrations.
    ///
    /// # Errors
    /// Connection failures classify as `Network`; authentication and schema
    /// failures as fatal `Database`.
    pub async fn connect(database_url: &str, pool: &PoolConfig) -> CoreResult<Self> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options
            .max_connections(pool.max_connections)
            .min_connections(pool.min_connections)
            .idle_timeout(pool.idle_timeout)
            .acquire_timeout(pool.acquire_timeout)
            .connect_timeout(pool.acquire_timeout)
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug)
            .sqlx_slow_statements_logging_settings(
                log::LevelFilter::Warn,
                pool.slow_statement_threshold,
            );

        let db = Database::connect(options)
            .await
            .map_err(|e| classify(&e, ORIGIN))?;

        Migrator::up(&db, None)
            .await
            .map_err(|e| classify(&e, ORIGIN))?;

        log::info!(
            max_connections = pool.max_connections, min_connections = pool.min_connections;
            "Postgres store connected (pool {}..={})",
            pool.min_connections,
            pool.max_connections
        );
        Ok(Self {
            db,
            pool: pool.clone(),
        })
    }

    /// Number of applied schema migrations.
    pub async fn schema_version(&self) -> CoreResult<u32> {
        let applied = Migrator::get_applied_migrations(&self.db)
            .await
            .map_err(|e| classify(&e, ORIGIN))?;
        Ok(u32::try_from(applied.len()).unwrap_or(u32::MAX))
    }

    /// Drain and close the pool.
    pub async fn close(self) -> CoreResult<()> {
        self.db.close().await.map_err(|e| classify(&e, ORIGIN))
    }

    /// Run one statement sequence, logging how long it took.
    async fn timed<T, F>(&self, operation: &str, fut: F) -> CoreResult<T>
    where
        F: Future<Output = CoreResult<T>>,
    {
        let started = Instant::now();
        let result = fut.await;
        let elapsed = started.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let ok = result.is_ok();

        if elapsed > self.pool.slow_statement_threshold {
            log::warn!(
                operation = operation, elapsed_ms = elapsed_ms, ok = ok;
                "Slow statement: {operation} took {elapsed_ms}ms (ok={ok})"
            );
        } else {
            log::debug!(
                operation = operation, elapsed_ms = elapsed_ms, ok = ok;
                "Statement {operation} finished in {elapsed_ms}ms (ok={ok})"
            );
        }
        result
    }
}

#[async_trait]
impl CredentialRepository for PostgresStore {
    async fn list(&self, query: &ListQuery) -> CoreResult<PaginatedResponse<CredentialRecord>> {
        let txn = records::begin(&self.db, ORIGIN).await?;
        let result = self.timed("list", records::list(&txn, query, ORIGIN)).await;
        records::finish(txn, result, ORIGIN).await
    }

    async fn get_by_id(&self, id: &str) -> CoreResult<CredentialRecord> {
        self.timed("get_by_id", records::get_by_id(&self.db, id, ORIGIN))
            .await
    }

    async fn create(&self, data: &NewCredential) -> CoreResult<CredentialRecord> {
        let txn = records::begin(&self.db, ORIGIN).await?;
        let result = self.timed("create", records::create(&txn, data, ORIGIN)).await;
        records::finish(txn, result, ORIGIN).await
    }

    async fn update(&self, id: &str, patch: &CredentialPatch) -> CoreResult<CredentialRecord> {
        let txn = records::begin(&self.db, ORIGIN).await?;
        let result = self
            .timed("update", records::update(&txn, id, patch, ORIGIN))
            .await;
        records::finish(txn, result, ORIGIN).await
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        let txn = records::begin(&self.db, ORIGIN).await?;
        let result = self.timed("delete", records::delete(&txn, id, ORIGIN)).await;
        records::finish(txn, result, ORIGIN).await
    }

    async fn stats(&self, window_days: u32) -> CoreResult<CredentialStats> {
        let txn = records::begin(&self.db, ORIGIN).await?;
        let result = self
            .timed("stats", records::stats(&txn, window_days, ORIGIN))
            .await;
        records::finish(txn, result, ORIGIN).await
    }
}
