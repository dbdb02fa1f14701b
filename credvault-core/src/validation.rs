//! Input validation and sanitization
//!
//! Runs before any repository is touched. Free-text fields are sanitized
//! first, then checked against their bounds; every violated field is
//! collected into one [`CoreError::Validation`](crate::error::CoreError).

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CoreError, CoreResult, ValidationErrors};
use crate::types::{
    CredentialPatch, ListQuery, NewCredential, PaginationParams, DEFAULT_PAGE, DEFAULT_PAGE_SIZE,
};

pub const SERVICE_MAX_LEN: usize = 100;
pub const USERNAME_MAX_LEN: usize = 100;
pub const SECRET_MAX_LEN: usize = 500;
pub const URL_MAX_LEN: usize = 2048;
pub const NOTES_MAX_LEN: usize = 1000;

/// Markup tags, comment delimiters and quote characters.
static STRIP_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<[^<>]*>|--|/\*|\*/|["'`]"#).ok());

/// Strip markup tags, comment delimiters (`--`, `/*`, `*/`) and quotes, then trim.
///
/// Repeats until stable so that removals cannot leave a new delimiter behind
/// (`-/**/-` must not become `--`).
#[must_use]
pub fn sanitize_text(input: &str) -> String {
    let Some(re) = STRIP_PATTERN.as_ref() else {
        return input.trim().to_string();
    };

    let mut current = input.to_string();
    loop {
        let next = re.replace_all(&current, "").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_string()
}

fn check_required(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len == 0 {
        errors.push(field, "is required");
    } else if len > max {
        errors.push(field, format!("must be at most {max} characters"));
    }
}

fn check_url(errors: &mut ValidationErrors, value: &str) {
    if value.chars().count() > URL_MAX_LEN {
        errors.push("url", format!("must be at most {URL_MAX_LEN} characters"));
        return;
    }
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {}
        Ok(_) => errors.push("url", "must be an absolute http(s) URL"),
        Err(e) => errors.push("url", format!("is not a valid URL: {e}")),
    }
}

fn check_notes(errors: &mut ValidationErrors, value: &str) {
    if value.chars().count() > NOTES_MAX_LEN {
        errors.push("notes", format!("must be at most {NOTES_MAX_LEN} characters"));
    }
}

/// Sanitize an optional free-text value; empty results normalize to `None`.
fn sanitize_optional(value: Option<&String>) -> Option<String> {
    value.map(|v| sanitize_text(v)).filter(|v| !v.is_empty())
}

/// Validate a create request, returning the sanitized copy.
pub fn validate_new(input: &NewCredential) -> CoreResult<NewCredential> {
    let sanitized = NewCredential {
        service: sanitize_text(&input.service),
        username: sanitize_text(&input.username),
        secret: input.secret.clone(),
        url: sanitize_optional(input.url.as_ref()),
        notes: sanitize_optional(input.notes.as_ref()),
    };

    let mut errors = ValidationErrors::new();
    check_required(&mut errors, "service", &sanitized.service, SERVICE_MAX_LEN);
    check_required(&mut errors, "username", &sanitized.username, USERNAME_MAX_LEN);
    check_required(&mut errors, "secret", &sanitized.secret, SECRET_MAX_LEN);
    if let Some(ref url) = sanitized.url {
        check_url(&mut errors, url);
    }
    if let Some(ref notes) = sanitized.notes {
        check_notes(&mut errors, notes);
    }
    errors.into_result()?;

    Ok(sanitized)
}

/// Validate an update patch. Only present fields are checked; an empty patch is rejected.
pub fn validate_patch(patch: &CredentialPatch) -> CoreResult<CredentialPatch> {
    let mut errors = ValidationErrors::new();
    if patch.is_empty() {
        errors.push("patch", "at least one field must be provided");
        return Err(CoreError::Validation(errors));
    }

    let sanitized = CredentialPatch {
        service: patch.service.as_deref().map(sanitize_text),
        username: patch.username.as_deref().map(sanitize_text),
        secret: patch.secret.clone(),
        url: patch.url.as_ref().map(|v| sanitize_optional(v.as_ref())),
        notes: patch.notes.as_ref().map(|v| sanitize_optional(v.as_ref())),
    };

    if let Some(ref service) = sanitized.service {
        check_required(&mut errors, "service", service, SERVICE_MAX_LEN);
    }
    if let Some(ref username) = sanitized.username {
        check_required(&mut errors, "username", username, USERNAME_MAX_LEN);
    }
    if let Some(ref secret) = sanitized.secret {
        check_required(&mut errors, "secret", secret, SECRET_MAX_LEN);
    }
    if let Some(Some(ref url)) = sanitized.url {
        check_url(&mut errors, url);
    }
    if let Some(Some(ref notes)) = sanitized.notes {
        check_notes(&mut errors, notes);
    }
    errors.into_result()?;

    Ok(sanitized)
}

/// Build a list query from raw caller input.
///
/// Missing pagination values take their defaults and out-of-range values
/// are clamped rather than rejected. An empty search term means no filter.
#[must_use]
pub fn normalize_list_query(
    search: Option<&str>,
    page: Option<u32>,
    page_size: Option<u32>,
) -> ListQuery {
    let pagination = PaginationParams {
        page: page.unwrap_or(DEFAULT_PAGE),
        page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    }
    .validated();

    ListQuery {
        search: search.map(sanitize_text).filter(|s| !s.is_empty()),
        pagination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_errors(err: CoreError) -> ValidationErrors {
        match err {
            CoreError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn sanitize_strips_markup_quotes_and_comments() {
        assert_eq!(sanitize_text("<b>Gmail</b>"), "Gmail");
        assert_eq!(sanitize_text("o'brien"), "obrien");
        assert_eq!(sanitize_text("x -- drop"), "x  drop");
        assert_eq!(sanitize_text("a/* c */b"), "a c b");
        assert_eq!(sanitize_text("-/**/-"), "");
        assert_eq!(sanitize_text("  spaced  "), "spaced");
    }

    #[test]
    fn service_of_101_chars_is_rejected() {
        let input = NewCredential::new("s".repeat(101), "alice", "pw");
        let errors = field_errors(validate_new(&input).unwrap_err());
        assert!(errors.contains("service"));
        assert_eq!(errors.fields.len(), 1);
    }

    #[test]
    fn service_of_100_chars_is_accepted() {
        let input = NewCredential::new("s".repeat(100), "alice", "pw");
        assert!(validate_new(&input).is_ok());
    }

    #[test]
    fn every_violated_field_is_reported() {
        let input = NewCredential {
            service: String::new(),
            username: "u".repeat(101),
            secret: String::new(),
            url: Some("ftp://example.com".to_string()),
            notes: Some("n".repeat(1001)),
        };
        let errors = field_errors(validate_new(&input).unwrap_err());
        for field in ["service", "username", "secret", "url", "notes"] {
            assert!(errors.contains(field), "missing {field}");
        }
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let input = NewCredential::new("é".repeat(100), "alice", "pw");
        assert!(validate_new(&input).is_ok());
    }

    #[test]
    fn secret_is_never_rewritten() {
        let input = NewCredential::new("Gmail", "alice", "<p>'--'</p>");
        let out = validate_new(&input).unwrap();
        assert_eq!(out.secret, "<p>'--'</p>");
    }

    #[test]
    fn markup_only_service_is_required_after_sanitizing() {
        let input = NewCredential::new("<script></script>", "alice", "pw");
        let errors = field_errors(validate_new(&input).unwrap_err());
        assert!(errors.contains("service"));
    }

    #[test]
    fn empty_optionals_become_none() {
        let input = NewCredential::new("Gmail", "alice", "pw")
            .with_url("  ")
            .with_notes("");
        let out = validate_new(&input).unwrap();
        assert!(out.url.is_none());
        assert!(out.notes.is_none());
    }

    #[test]
    fn url_must_be_absolute_http() {
        let ok = NewCredential::new("Gmail", "alice", "pw").with_url("https://mail.google.com");
        assert!(validate_new(&ok).is_ok());

        let relative = NewCredential::new("Gmail", "alice", "pw").with_url("/login");
        assert!(field_errors(validate_new(&relative).unwrap_err()).contains("url"));
    }

    #[test]
    fn empty_patch_is_rejected() {
        let errors = field_errors(validate_patch(&CredentialPatch::default()).unwrap_err());
        assert_eq!(errors.fields.len(), 1);
        assert!(errors.contains("patch"));
    }

    #[test]
    fn patch_reports_every_invalid_field() {
        let patch = CredentialPatch {
            service: Some("s".repeat(SERVICE_MAX_LEN + 1)),
            url: Some(Some("ftp://files".to_string())),
            ..CredentialPatch::default()
        };
        let errors = field_errors(validate_patch(&patch).unwrap_err());
        assert!(errors.contains("service"));
        assert!(errors.contains("url"));
        assert!(!errors.contains("patch"));
    }

    #[test]
    fn patch_checks_only_present_fields() {
        let patch = CredentialPatch::secret("new-secret");
        let out = validate_patch(&patch).unwrap();
        assert_eq!(out.secret.as_deref(), Some("new-secret"));
        assert!(out.service.is_none());

        let bad = CredentialPatch {
            service: Some(String::new()),
            ..CredentialPatch::default()
        };
        assert!(field_errors(validate_patch(&bad).unwrap_err()).contains("service"));
    }

    #[test]
    fn patch_null_clears_and_empty_string_clears() {
        let patch = CredentialPatch {
            notes: Some(Some("   ".to_string())),
            url: Some(None),
            ..CredentialPatch::default()
        };
        let out = validate_patch(&patch).unwrap();
        assert_eq!(out.notes, Some(None));
        assert_eq!(out.url, Some(None));
    }

    #[test]
    fn list_query_defaults_and_clamps() {
        let q = normalize_list_query(None, None, None);
        assert_eq!(q.pagination, PaginationParams::default());
        assert!(q.search.is_none());

        let q = normalize_list_query(Some("  "), Some(0), Some(1000));
        assert!(q.search.is_none());
        assert_eq!(q.pagination.page, 1);
        assert_eq!(q.pagination.page_size, 100);

        let q = normalize_list_query(Some(" GMAIL "), Some(2), Some(10));
        assert_eq!(q.search.as_deref(), Some("GMAIL"));
    }
}
