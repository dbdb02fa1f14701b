//! Credential record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Record ID (UUID)
    pub id: String,
    /// Service name, e.g. "Gmail"
    pub service: String,
    /// Login for the service
    pub username: String,
    /// Secret value, stored as given
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation time
    #[serde(rename = "createdAt")]
    #[serde(with = "crate::utils::datetime")]
    pub created_at: DateTime<Utc>,
    /// Last update time
    #[serde(rename = "updatedAt")]
    #[serde(with = "crate::utils::datetime")]
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Build a fresh record from validated input, assigning id and timestamps.
    #[must_use]
    pub fn from_new(data: NewCredential) -> Self {
        let now = crate::utils::datetime::now_micros();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            service: data.service,
            username: data.username,
            secret: data.secret,
            url: data.url,
            notes: data.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch and refresh `updated_at`.
    ///
    /// `updated_at` always moves forward, even when the clock has not ticked
    /// since the previous write.
    pub fn apply(&mut self, patch: &CredentialPatch) {
        if let Some(ref service) = patch.service {
            self.service.clone_from(service);
        }
        if let Some(ref username) = patch.username {
            self.username.clone_from(username);
        }
        if let Some(ref secret) = patch.secret {
            self.secret.clone_from(secret);
        }
        if let Some(ref url) = patch.url {
            self.url.clone_from(url);
        }
        if let Some(ref notes) = patch.notes {
            self.notes.clone_from(notes);
        }
        self.updated_at = crate::utils::datetime::next_after(self.updated_at);
    }
}

/// Create request
///
/// Missing required fields deserialize as empty strings so that validation
/// can report all of them at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCredential {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewCredential {
    /// Required fields only.
    #[must_use]
    pub fn new(
        service: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            username: username.into(),
            secret: secret.into(),
            url: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial update request (supports clearing optional fields)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// `Some(None)` clears the url
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::utils::double_option"
    )]
    pub url: Option<Option<String>>,

    /// `Some(None)` clears the notes
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::utils::double_option"
    )]
    pub notes: Option<Option<String>>,
}

impl CredentialPatch {
    #[must_use]
    pub fn secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Self::default()
        }
    }

    /// No field present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.service.is_none()
            && self.username.is_none()
            && self.secret.is_none()
            && self.url.is_none()
            && self.notes.is_none()
    }
}
