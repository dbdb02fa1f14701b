//! Credential management service
//!
//! Application-facing entry point: validates and sanitizes input, then
//! delegates to whichever repository the backend selector handed out.

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::traits::CredentialRepository;
use crate::types::{
    CredentialPatch, CredentialRecord, CredentialStats, NewCredential, PaginatedResponse,
};
use crate::utils::truncate_for_log;
use crate::validation;

/// Window used by [`CredentialService::stats`] when the caller gives none.
pub const DEFAULT_STATS_WINDOW_DAYS: u32 = 30;
/// Largest accepted stats window (ten years).
pub const MAX_STATS_WINDOW_DAYS: u32 = 3650;

/// Credential management service
pub struct CredentialService {
    repository: Arc<dyn CredentialRepository>,
}

impl CredentialService {
    /// Create a service instance
    #[must_use]
    pub fn new(repository: Arc<dyn CredentialRepository>) -> Self {
        Self { repository }
    }

    /// List credentials with optional search and pagination
    pub async fn list(
        &self,
        search: Option<&str>,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> CoreResult<PaginatedResponse<CredentialRecord>> {
        let query = validation::normalize_list_query(search, page, page_size);
        if let Some(ref term) = query.search {
            log::debug!("Listing credentials matching '{}'", truncate_for_log(term));
        }
        self.repository.list(&query).await
    }

    /// Get a single credential
    pub async fn get(&self, id: &str) -> CoreResult<CredentialRecord> {
        self.repository.get_by_id(id).await
    }

    /// Create a credential
    pub async fn create(&self, input: NewCredential) -> CoreResult<CredentialRecord> {
        let data = validation::validate_new(&input)?;
        let record = self.repository.create(&data).await?;
        log::info!(
            "Credential created: id={}, service={}",
            record.id,
            truncate_for_log(&record.service)
        );
        Ok(record)
    }

    /// Apply a partial update
    pub async fn update(&self, id: &str, patch: CredentialPatch) -> CoreResult<CredentialRecord> {
        let patch = validation::validate_patch(&patch)?;
        let record = self.repository.update(id, &patch).await?;
        log::info!("Credential updated: id={id}");
        Ok(record)
    }

    /// Delete a credential
    pub async fn delete(&self, id: &str) -> CoreResult<()> {
        self.repository.delete(id).await?;
        log::info!("Credential deleted: id={id}");
        Ok(())
    }

    /// Aggregate statistics over the store
    pub async fn stats(&self, window_days: Option<u32>) -> CoreResult<CredentialStats> {
        let window_days = window_days.unwrap_or(DEFAULT_STATS_WINDOW_DAYS);
        if window_days > MAX_STATS_WINDOW_DAYS {
            return Err(CoreError::invalid_field(
                "window_days",
                format!("must be at most {MAX_STATS_WINDOW_DAYS}"),
            ));
        }
        self.repository.stats(window_days).await
    }
}
