//! Error types for booklib-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., duplicate ISBN or already-rated book
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream metadata provider failure (502)
    #[error("Provider unavailable: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// booklib-common error
    #[error("Common error: {0}")]
    Common(#[from] booklib_common::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Common(err.into())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation { .. } => ApiError::BadRequest(err.to_string()),
            CatalogError::DuplicateIsbn { .. } | CatalogError::DuplicateTitleAuthor { .. } => {
                ApiError::Conflict(err.to_string())
            }
            CatalogError::Provider(e) => ApiError::Upstream(e.to_string()),
            CatalogError::Storage(e) => ApiError::Common(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "PROVIDER_UNAVAILABLE", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;

    #[test]
    fn test_catalog_error_status_mapping() {
        let validation: ApiError = CatalogError::Validation {
            field: "title",
            reason: "title must be non-empty".to_string(),
        }
        .into();
        assert!(matches!(validation, ApiError::BadRequest(_)));

        let conflict: ApiError = CatalogError::DuplicateIsbn {
            owner_title: "Dune".to_string(),
            owner_authors: vec!["Frank Herbert".to_string()],
        }
        .into();
        assert!(matches!(conflict, ApiError::Conflict(_)));

        let upstream: ApiError =
            CatalogError::Provider(ProviderError::Remote { status: 503 }).into();
        assert!(matches!(upstream, ApiError::Upstream(_)));
    }

    #[test]
    fn test_duplicate_isbn_message_names_owner() {
        let err: ApiError = CatalogError::DuplicateIsbn {
            owner_title: "Dune".to_string(),
            owner_authors: vec!["Frank Herbert".to_string()],
        }
        .into();

        let message = err.to_string();
        assert!(message.contains("Frank Herbert"));
        assert!(message.contains("Dune"));
    }
}
