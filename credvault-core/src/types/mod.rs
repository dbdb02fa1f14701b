//! Type definition module

mod credential;
mod pagination;
mod response;

pub use credential::{CredentialPatch, CredentialRecord, NewCredential};
pub use pagination::{
    sort_service_counts, CredentialStats, ListQuery, PaginatedResponse, PaginationParams,
    ServiceCount, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use response::ApiResponse;
