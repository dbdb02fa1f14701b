//! Test helper module
//!
//! In-memory repository with failure injection, used by service and retry tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::traits::CredentialRepository;
use crate::types::{
    sort_service_counts, CredentialPatch, CredentialRecord, CredentialStats, ListQuery,
    NewCredential, PaginatedResponse, ServiceCount,
};

// ===== MockCredentialRepository =====

pub struct MockCredentialRepository {
    records: RwLock<HashMap<String, CredentialRecord>>,
    /// Errors returned, in order, by the next calls (before touching the map)
    failures: RwLock<VecDeque<CoreError>>,
    calls: RwLock<u32>,
}

impl Default for MockCredentialRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCredentialRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            failures: RwLock::new(VecDeque::new()),
            calls: RwLock::new(0),
        }
    }

    /// Queue an error for the next call.
    pub async fn fail_next(&self, err: CoreError) {
        self.failures.write().await.push_back(err);
    }

    /// Number of repository calls so far, failed ones included.
    pub async fn call_count(&self) -> u32 {
        *self.calls.read().await
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    async fn enter(&self) -> CoreResult<()> {
        *self.calls.write().await += 1;
        match self.failures.write().await.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn taken(
        records: &HashMap<String, CredentialRecord>,
        service: &str,
        username: &str,
        except_id: Option<&str>,
    ) -> bool {
        records.values().any(|r| {
            r.service == service && r.username == username && Some(r.id.as_str()) != except_id
        })
    }
}

#[async_trait]
impl CredentialRepository for MockCredentialRepository {
    async fn list(&self, query: &ListQuery) -> CoreResult<PaginatedResponse<CredentialRecord>> {
        self.enter().await?;
        let needle = query.search.as_ref().map(|s| s.to_lowercase());

        let mut matching: Vec<CredentialRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| {
                needle.as_ref().is_none_or(|n| {
                    r.service.to_lowercase().contains(n) || r.username.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));

        let total = matching.len() as u64;
        let pagination = query.pagination;
        let items = matching
            .into_iter()
            .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
            .take(pagination.page_size as usize)
            .collect();
        Ok(PaginatedResponse::new(items, pagination, total))
    }

    async fn get_by_id(&self, id: &str) -> CoreResult<CredentialRecord> {
        self.enter().await?;
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    async fn create(&self, data: &NewCredential) -> CoreResult<CredentialRecord> {
        self.enter().await?;
        let mut records = self.records.write().await;
        if Self::taken(&records, &data.service, &data.username, None) {
            return Err(CoreError::Conflict(format!("{}/{}", data.service, data.username)));
        }
        let record = CredentialRecord::from_new(data.clone());
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, patch: &CredentialPatch) -> CoreResult<CredentialRecord> {
        self.enter().await?;
        let mut records = self.records.write().await;
        let mut record = records
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        record.apply(patch);
        if Self::taken(&records, &record.service, &record.username, Some(id)) {
            return Err(CoreError::Conflict(format!("{}/{}", record.service, record.username)));
        }
        records.insert(id.to_string(), record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.enter().await?;
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    async fn stats(&self, window_days: u32) -> CoreResult<CredentialStats> {
        self.enter().await?;
        let records = self.records.read().await;
        let since = chrono::Utc::now().checked_sub_signed(Duration::days(i64::from(window_days)));

        let mut per_service: HashMap<&str, u64> = HashMap::new();
        for record in records.values() {
            *per_service.entry(record.service.as_str()).or_default() += 1;
        }
        let mut per_service: Vec<ServiceCount> = per_service
            .into_iter()
            .map(|(service, count)| ServiceCount {
                service: service.to_string(),
                count,
            })
            .collect();
        sort_service_counts(&mut per_service);

        Ok(CredentialStats {
            total: records.len() as u64,
            recent_count: records
                .values()
                .filter(|r| since.is_none_or(|since| r.created_at >= since))
                .count() as u64,
            window_days,
            per_service,
        })
    }
}
