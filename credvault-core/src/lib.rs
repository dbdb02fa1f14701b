//! `CredVault` Core Library
//!
//! Platform-independent core of the credential store:
//! - Credential types and the unified error taxonomy
//! - The `CredentialRepository` contract every storage backend implements
//! - Input validation/sanitization and the retry decorator
//! - `CredentialService`, the application-facing facade
//!
//! Storage backends live in `credvault-app`; this crate never touches a database.

pub mod error;
pub mod retry;
pub mod services;
pub mod traits;
pub mod types;
pub mod utils;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult, ErrorKind};
pub use retry::{with_retry, with_retry_if, RetryPolicy, RetryingRepository};
pub use services::CredentialService;
pub use traits::CredentialRepository;
