//! HTTP boundary for `CredVault`.
//!
//! Routes translate requests into [`CredentialService`](credvault_core::CredentialService)
//! calls and map every [`CoreError`] kind onto a fixed status code.

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;

use credvault_app::AppState;
use credvault_core::CoreError;

pub use config::{LogConfig, LogFormat, ServerConfig, TomlConfigSource, WebConfig};
pub use error::ApiError;
pub use routes::configure;

/// Shared handler state.
pub struct WebState {
    pub app: AppState,
    /// Include backend detail in error bodies (non-production only).
    pub expose_error_detail: bool,
}

impl WebState {
    #[must_use]
    pub fn new(app: AppState, expose_error_detail: bool) -> Self {
        Self {
            app,
            expose_error_detail,
        }
    }

    /// Wrap `error` for the response, honoring the detail setting.
    #[must_use]
    pub fn fail(&self, error: CoreError) -> ApiError {
        ApiError::new(error, self.expose_error_detail)
    }
}
