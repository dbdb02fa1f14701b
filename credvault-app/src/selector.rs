//! Backend selection and instance caching.
//!
//! [`BackendSelector`] is constructed once at startup and injected where it
//! is needed. Detection is a pure function of the configuration snapshot;
//! connectivity is only exercised when an instance is actually built.

use std::collections::HashMap;
use std::sync::Arc;

use credvault_core::error::{CoreError, CoreResult};
use credvault_core::traits::CredentialRepository;
use credvault_core::RetryingRepository;
use tokio::sync::Mutex;

use crate::config::{BackendKind, StoreConfig};

/// The live backend handed to consumers.
#[derive(Clone)]
pub struct BackendHandle {
    pub kind: BackendKind,
    /// Retry-wrapped repository
    pub repository: Arc<dyn CredentialRepository>,
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHandle")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Pick a backend kind: explicit force flag, then a valid remote URL, then local.
#[must_use]
pub fn detect(config: &StoreConfig) -> BackendKind {
    if let Some(kind) = config.backend {
        return kind;
    }
    if config.remote_url().is_some() {
        BackendKind::Remote
    } else {
        BackendKind::Local
    }
}

/// Factory and cache for backend instances.
pub struct BackendSelector {
    config: StoreConfig,
    cache: Mutex<HashMap<BackendKind, Arc<dyn CredentialRepository>>>,
}

impl BackendSelector {
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Backend kind for the current snapshot. No I/O.
    #[must_use]
    pub fn detect(&self) -> BackendKind {
        detect(&self.config)
    }

    /// Cached instance for the detected kind, built on first use.
    pub async fn get_default(&self) -> CoreResult<BackendHandle> {
        let kind = self.detect();
        let mut cache = self.cache.lock().await;

        if let Some(repository) = cache.get(&kind) {
            return Ok(BackendHandle {
                kind,
                repository: Arc::clone(repository),
            });
        }

        let repository = self.build(kind).await?;
        cache.insert(kind, Arc::clone(&repository));
        Ok(BackendHandle { kind, repository })
    }

    /// Build `kind` regardless of detection and replace its cache entry.
    pub async fn get_forced(&self, kind: BackendKind) -> CoreResult<BackendHandle> {
        let mut cache = self.cache.lock().await;
        let repository = self.build(kind).await?;
        if cache.insert(kind, Arc::clone(&repository)).is_some() {
            log::info!("Replaced cached {kind} backend");
        }
        Ok(BackendHandle { kind, repository })
    }

    /// Drop every cached instance. The next `get_default` rebuilds.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.lock().await;
        let dropped = cache.len();
        cache.clear();
        log::debug!("Backend cache cleared ({dropped} instance(s))");
    }

    /// Kinds currently held in the cache.
    pub async fn cached_kinds(&self) -> Vec<BackendKind> {
        self.cache.lock().await.keys().copied().collect()
    }

    async fn build(&self, kind: BackendKind) -> CoreResult<Arc<dyn CredentialRepository>> {
        log::info!("Initializing {kind} backend");
        let store = match kind {
            BackendKind::Local => self.open_local().await?,
            BackendKind::Remote => self.open_remote().await?,
        };
        Ok(Arc::new(RetryingRepository::new(store, self.config.retry)))
    }

    #[cfg(feature = "sqlite")]
    async fn open_local(&self) -> CoreResult<Arc<dyn CredentialRepository>> {
        use crate::adapters::SqliteStore;

        let path = self.config.local_path.as_path();
        let store = credvault_core::with_retry(&self.config.retry, "open_local", || {
            SqliteStore::open(path)
        })
        .await?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "sqlite"))]
    async fn open_local(&self) -> CoreResult<Arc<dyn CredentialRepository>> {
        Err(not_compiled(BackendKind::Local))
    }

    #[cfg(feature = "postgres")]
    async fn open_remote(&self) -> CoreResult<Arc<dyn CredentialRepository>> {
        use crate::adapters::PostgresStore;

        let url = self.config.remote_url().ok_or_else(|| {
            CoreError::invalid_field(
                crate::config::keys::DATABASE_URL,
                "a postgres:// connection string is required for the remote backend",
            )
        })?;
        let pool = &self.config.pool;
        let store = credvault_core::with_retry(&self.config.retry, "open_remote", || {
            PostgresStore::connect(url, pool)
        })
        .await?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "postgres"))]
    async fn open_remote(&self) -> CoreResult<Arc<dyn CredentialRepository>> {
        Err(not_compiled(BackendKind::Remote))
    }
}

#[cfg(not(all(feature = "sqlite", feature = "postgres")))]
fn not_compiled(kind: BackendKind) -> CoreError {
    CoreError::invalid_field(
        crate::config::keys::BACKEND,
        format!("the {kind} backend is not compiled into this build"),
    )
}
