//! Unified error type definition
//!
//! Every backend failure is normalized into one of the [`ErrorKind`] classes
//! before it leaves the storage adapters. Callers only ever see `CoreError`.

use serde::Serialize;
use thiserror::Error;

/// A single violated field reported by the validation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Machine-readable field key (`service`, `username`, ...).
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All field violations collected from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for `field`.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldError::new(field, message));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `field` has at least one violation.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    /// Convert into `Ok(())` when nothing was recorded, otherwise a `CoreError::Validation`.
    pub fn into_result(self) -> CoreResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .fields
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Classified error kinds. Independent of any backend-native error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Permission,
    Network,
    Database,
    Unknown,
}

impl ErrorKind {
    /// Stable machine-readable code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Permission => "permission",
            Self::Network => "network",
            Self::Database => "database",
            Self::Unknown => "unknown",
        }
    }

    /// Generic message surfaced to callers for this kind.
    #[must_use]
    pub fn generic_message(self) -> &'static str {
        match self {
            Self::Validation => "The request contains invalid data",
            Self::Conflict => "A credential for this service and username already exists",
            Self::NotFound => "The requested credential was not found",
            Self::Permission => "Permission denied",
            Self::Network => "The credential store is temporarily unreachable",
            Self::Database => "The credential store failed to process the request",
            Self::Unknown => "An unexpected error occurred",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core layer error type
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Malformed or out-of-bound input. Lists every violated field.
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// `(service, username)` already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Target id does not exist.
    #[error("Credential not found: {0}")]
    NotFound(String),

    /// The store refused the operation for lack of privilege.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Connectivity or timeout reaching the store.
    #[error("Network error: {0}")]
    Network(String),

    /// Backend-internal failure. `transient` failures are retried.
    #[error("Database error: {detail}")]
    Database { detail: String, transient: bool },

    /// Anything that could not be classified.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl CoreError {
    /// Shortcut for a single-field validation error.
    #[must_use]
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.push(field, message);
        Self::Validation(errors)
    }

    #[must_use]
    pub fn database(detail: impl Into<String>, transient: bool) -> Self {
        Self::Database {
            detail: detail.into(),
            transient,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Permission(_) => ErrorKind::Permission,
            Self::Network(_) => ErrorKind::Network,
            Self::Database { .. } => ErrorKind::Database,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Whether the retry wrapper may re-attempt the operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Unknown(_) => true,
            Self::Database { transient, .. } => *transient,
            Self::Validation(_) | Self::Conflict(_) | Self::NotFound(_) | Self::Permission(_) => {
                false
            }
        }
    }

    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Conflict(_) | Self::NotFound(_)
        )
    }

    /// The message shown to callers. Never carries backend detail.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        self.kind().generic_message()
    }

    /// Internal detail (native codes, driver messages). Only for logs and non-production bodies.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Validation(errors) => errors.to_string(),
            Self::Conflict(d)
            | Self::NotFound(d)
            | Self::Permission(d)
            | Self::Network(d)
            | Self::Unknown(d) => d.clone(),
            Self::Database { detail, .. } => detail.clone(),
        }
    }

    /// Build the caller-facing error body.
    ///
    /// Field errors are always included for validation failures since they
    /// describe the caller's own input.
    #[must_use]
    pub fn to_body(&self, include_detail: bool) -> ErrorBody {
        ErrorBody {
            code: self.kind(),
            message: self.user_message().to_string(),
            fields: match self {
                Self::Validation(errors) => errors.fields.clone(),
                _ => Vec::new(),
            },
            detail: include_detail.then(|| self.detail()),
        }
    }
}

/// Serializable error payload for API boundaries.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
