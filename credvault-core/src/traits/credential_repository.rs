//! Credential persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{
    CredentialPatch, CredentialRecord, CredentialStats, ListQuery, NewCredential,
    PaginatedResponse,
};

/// Credential repository Trait
///
/// Implementations:
/// - `SqliteStore`: embedded file database (local backend)
/// - `PostgresStore`: pooled remote database (remote backend)
/// - `RetryingRepository`: decorator adding classified retries to any of the above
///
/// Inputs reaching a repository have already been validated and sanitized.
/// Every error returned is already classified; backend-native codes never
/// escape an implementation.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// List records, newest `updated_at` first (ties by `id` ascending).
    ///
    /// # Arguments
    /// * `query` - Optional search term plus clamped pagination
    async fn list(&self, query: &ListQuery) -> CoreResult<PaginatedResponse<CredentialRecord>>;

    /// Get a record by ID, `NotFound` if absent
    async fn get_by_id(&self, id: &str) -> CoreResult<CredentialRecord>;

    /// Insert a new record
    ///
    /// `Conflict` when `(service, username)` is already taken.
    async fn create(&self, data: &NewCredential) -> CoreResult<CredentialRecord>;

    /// Apply a partial update and refresh `updated_at`
    ///
    /// # Arguments
    /// * `id` - Record ID
    /// * `patch` - Fields to change; absent fields are kept
    async fn update(&self, id: &str, patch: &CredentialPatch) -> CoreResult<CredentialRecord>;

    /// Hard delete, `NotFound` if absent
    async fn delete(&self, id: &str) -> CoreResult<()>;

    /// Aggregate counts
    ///
    /// # Arguments
    /// * `window_days` - Records created within this many days count as recent
    async fn stats(&self, window_days: u32) -> CoreResult<CredentialStats>;
}
