//! Application error type and its HTTP mapping.
//!
//! Every failure the engine can surface to a caller is an [`AppError`] variant.
//! Capability-level errors ([`StoreError`], [`CompletionError`], [`SinkError`])
//! are converted at the seam where the engine decides whether they are fatal.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The slug does not fully match the configured pattern.
    #[error("Slug does not match the required pattern")]
    MalformedSlug { slug: String },

    /// The slug is part of the reserved set.
    #[error("Slug is reserved")]
    ReservedSlug { slug: String },

    #[error("Slug already exists")]
    SlugAlreadyExists { slug: String },

    /// Every generation attempt collided or drew a reserved slug.
    #[error("Failed to generate a unique slug after {attempts} attempts")]
    GenerationExhausted { attempts: usize },

    /// The slug does not resolve (absent or expired).
    #[error("Link not found")]
    NotFound { slug: String },

    /// The slug is reserved and never resolves to a link.
    #[error("Slug is not redirectable")]
    NotRedirectable { slug: String },

    #[error("Link store unavailable: {0}")]
    StoreUnavailable(String),

    /// Non-fatal: the assisted generation path falls back to random slugs.
    #[error("Slug suggestion unavailable: {0}")]
    SuggestionUnavailable(String),

    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    Unauthorized { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MalformedSlug { .. } => (StatusCode::BAD_REQUEST, "malformed_slug"),
            Self::ReservedSlug { .. } => (StatusCode::BAD_REQUEST, "reserved_slug"),
            Self::SlugAlreadyExists { .. } => (StatusCode::CONFLICT, "slug_already_exists"),
            Self::GenerationExhausted { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "generation_exhausted")
            }
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            Self::NotRedirectable { .. } => (StatusCode::NOT_FOUND, "not_redirectable"),
            Self::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
            Self::SuggestionUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "suggestion_unavailable")
            }
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
        }
    }

    fn details(&self) -> Value {
        match self {
            Self::MalformedSlug { slug } | Self::ReservedSlug { slug } => {
                json!({ "field": "slug", "slug": slug })
            }
            Self::SlugAlreadyExists { slug } => json!({ "field": "slug", "slug": slug }),
            Self::NotFound { slug } | Self::NotRedirectable { slug } => json!({ "slug": slug }),
            Self::GenerationExhausted { attempts } => json!({ "attempts": attempts }),
            Self::StoreUnavailable(_) | Self::SuggestionUnavailable(_) => json!({}),
            Self::Validation { details, .. } | Self::Unauthorized { details, .. } => {
                details.clone()
            }
        }
    }

    /// Converts the error into the payload used in API bodies.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code) = self.status_and_code();
        ErrorInfo {
            code,
            message: self.to_string(),
            details: self.details(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
        AppError::bad_request(
            "Request validation failed",
            json!({ "fields": fields, "errors": errors }),
        )
    }
}

/// Errors raised by a key-value store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Stored value is corrupt: {0}")]
    Corrupt(String),

    #[error("Cache entry could not be invalidated: {0}")]
    StaleCache(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

/// Errors raised by a language-model completion backend.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    Request(String),

    #[error("Completion service returned status {0}")]
    Status(u16),

    #[error("Completion response was malformed: {0}")]
    Malformed(String),

    #[error("Completion service is not configured")]
    Disabled,
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        CompletionError::Request(e.to_string())
    }
}

/// Errors raised by an analytics sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Analytics sink write failed: {0}")]
    Write(String),
}

impl From<sqlx::Error> for SinkError {
    fn from(e: sqlx::Error) -> Self {
        SinkError::Write(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::MalformedSlug { slug: "A".into() },
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::ReservedSlug {
                    slug: "dashboard".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::SlugAlreadyExists { slug: "a".into() },
                StatusCode::CONFLICT,
            ),
            (
                AppError::NotFound { slug: "a".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::NotRedirectable { slug: "a".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::StoreUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_error_info_distinguishes_creation_failures() {
        let malformed = AppError::MalformedSlug { slug: "A".into() }.to_error_info();
        let reserved = AppError::ReservedSlug { slug: "a".into() }.to_error_info();
        let duplicate = AppError::SlugAlreadyExists { slug: "a".into() }.to_error_info();

        assert_eq!(malformed.code, "malformed_slug");
        assert_eq!(reserved.code, "reserved_slug");
        assert_eq!(duplicate.code, "slug_already_exists");
        assert_eq!(malformed.details["field"], "slug");
    }

    #[test]
    fn test_unauthorized_sets_www_authenticate() {
        let response = AppError::unauthorized("Unauthorized", json!({})).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("www-authenticate").unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_store_error_becomes_store_unavailable() {
        let err: AppError = StoreError::Backend("connection reset".into()).into();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_stale_cache_becomes_store_unavailable() {
        let err: AppError = StoreError::StaleCache("redis down".into()).into();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[test]
    fn test_validation_errors_list_fields() {
        use validator::Validate;

        #[derive(Validate)]
        struct Input {
            #[validate(url)]
            url: String,
        }

        let errors = Input {
            url: "not a url".to_string(),
        }
        .validate()
        .unwrap_err();

        let info = AppError::from(errors).to_error_info();
        assert_eq!(info.code, "validation_error");
        assert_eq!(info.details["fields"], json!(["url"]));
    }
}
