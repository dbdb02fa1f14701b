//! Application bootstrap for `CredVault`.
//!
//! Provides the storage adapters, configuration snapshot, backend selector,
//! and `AppState` (service container) built once at startup via
//! `AppStateBuilder`.

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one of the `sqlite` or `postgres` features");

pub mod adapters;
pub mod config;
pub mod selector;

use std::sync::Arc;

use credvault_core::error::CoreResult;
use credvault_core::services::CredentialService;
use credvault_core::traits::CredentialRepository;

pub use config::{
    BackendKind, ConfigSource, EnvConfigSource, LayeredConfigSource, MapConfigSource, PoolConfig,
    StoreConfig,
};
pub use selector::{BackendHandle, BackendSelector};

/// Application state shared by every frontend.
pub struct AppState {
    /// Backend factory and cache
    pub selector: Arc<BackendSelector>,
    /// Active backend
    pub backend: BackendKind,
    /// Credential service
    pub credential_service: Arc<CredentialService>,
}

impl AppState {
    /// Rebuild the state against a freshly constructed backend of `kind`.
    pub async fn switch_backend(&self, kind: BackendKind) -> CoreResult<Self> {
        let handle = self.selector.get_forced(kind).await?;
        Ok(Self {
            selector: Arc::clone(&self.selector),
            backend: handle.kind,
            credential_service: Arc::new(CredentialService::new(handle.repository)),
        })
    }
}

/// Builder for constructing `AppState`.
///
/// # Required
/// - `config` (or an existing `selector`)
///
/// # Optional
/// - `force_backend`: skip detection
/// - `repository`: bypass the selector entirely (tests, embedding)
pub struct AppStateBuilder {
    config: Option<StoreConfig>,
    selector: Option<Arc<BackendSelector>>,
    force_backend: Option<BackendKind>,
    repository: Option<(BackendKind, Arc<dyn CredentialRepository>)>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            selector: None,
            force_backend: None,
            repository: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn selector(mut self, selector: Arc<BackendSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    #[must_use]
    pub fn force_backend(mut self, kind: BackendKind) -> Self {
        self.force_backend = Some(kind);
        self
    }

    /// Use `repository` as-is, reported as `kind`.
    #[must_use]
    pub fn repository(mut self, kind: BackendKind, repository: Arc<dyn CredentialRepository>) -> Self {
        self.repository = Some((kind, repository));
        self
    }

    /// Build the `AppState`, constructing the selected backend.
    pub async fn build(self) -> CoreResult<AppState> {
        let selector = self
            .selector
            .unwrap_or_else(|| Arc::new(BackendSelector::new(self.config.unwrap_or_default())));

        let (backend, repository) = match (self.repository, self.force_backend) {
            (Some(injected), _) => injected,
            (None, Some(kind)) => {
                let handle = selector.get_forced(kind).await?;
                (handle.kind, handle.repository)
            }
            (None, None) => {
                let handle = selector.get_default().await?;
                (handle.kind, handle.repository)
            }
        };

        log::info!("Application state ready ({backend} backend)");
        Ok(AppState {
            selector,
            backend,
            credential_service: Arc::new(CredentialService::new(repository)),
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
