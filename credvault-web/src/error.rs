//! HTTP error mapping
//!
//! Every handler failure is a [`CoreError`]; this module turns it into a
//! status code and a `{ "success": false, "error": { ... } }` body.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use credvault_core::error::{ErrorBody, ErrorKind};
use credvault_core::CoreError;
use serde::Serialize;

/// A `CoreError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError {
    pub error: CoreError,
    /// Attach backend detail to the body (non-production only).
    pub expose_detail: bool,
}

impl ApiError {
    #[must_use]
    pub fn new(error: CoreError, expose_detail: bool) -> Self {
        Self {
            error,
            expose_detail,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

/// Status code for each error kind.
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Permission => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Network => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Database | ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_for(self.error.kind())
    }

    fn error_response(&self) -> HttpResponse {
        let kind = self.error.kind();
        if self.error.is_expected() {
            tracing::warn!(kind = kind.as_str(), "Request failed: {}", self.error);
        } else {
            tracing::error!(kind = kind.as_str(), "Request failed: {}", self.error);
        }

        HttpResponse::build(self.status_code()).json(ErrorEnvelope {
            success: false,
            error: self.error.to_body(self.expose_detail),
        })
    }
}

/// Malformed JSON body or query string.
pub fn json_error(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::new(CoreError::invalid_field("body", err.to_string()), false).into()
}

pub fn query_error(err: actix_web::error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::new(CoreError::invalid_field("query", err.to_string()), false).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Permission), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Network), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorKind::Database), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(ErrorKind::Unknown), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn body_carries_code_and_generic_message() {
        let err = ApiError::new(CoreError::database("SQLSTATE 42P01", false), false);
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "database");
        assert_eq!(json["error"]["message"], ErrorKind::Database.generic_message());
        assert!(json["error"].get("detail").is_none());
    }

    #[actix_web::test]
    async fn detail_only_when_exposed() {
        let err = ApiError::new(CoreError::Network("connection refused".into()), true);
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["detail"], "connection refused");
    }
}
