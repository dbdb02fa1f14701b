//! API response related type definitions

use serde::{Deserialize, Serialize};

/// API response wrapper type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether it succeeded
    pub success: bool,
    /// Response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a success response
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Success without payload (delete)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
        }
    }
}
