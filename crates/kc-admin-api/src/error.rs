//! Admin API error types.
//!
//! Provides structured error handling for the flow management API,
//! mapping internal errors to appropriate HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kc_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the Admin API.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Resource not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        /// Type of entity (e.g., "AuthenticationFlow", "AuthenticatorConfig").
        entity_type: &'static str,
        /// Resource identifier.
        id: String,
    },

    /// Duplicate resource (unique constraint violation).
    #[error("{entity_type} already exists: {field} '{value}'")]
    Conflict {
        /// Type of entity.
        entity_type: &'static str,
        /// Field that caused the conflict.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// The resource's current state forbids the operation
    /// (built-in flow, flow still nested or bound).
    #[error("Conflict: {0}")]
    StateConflict(String),

    /// Invalid request data.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Stored flow definitions are inconsistent with the registered providers.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Storage layer error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdminError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a not found error for a UUID.
    #[must_use]
    pub fn not_found_id(entity_type: &'static str, id: Uuid) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(
        entity_type: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            entity_type,
            field,
            value: value.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } | Self::StateConflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(err) => match err {
                StorageError::NotFound { .. } | StorageError::NotFoundByName { .. } => {
                    StatusCode::NOT_FOUND
                }
                StorageError::Duplicate { .. } | StorageError::InUse { .. } => {
                    StatusCode::CONFLICT
                }
                StorageError::InvalidData(_) => StatusCode::BAD_REQUEST,
                StorageError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } | Self::StateConflict(_) => "conflict",
            Self::BadRequest(_) => "bad_request",
            Self::Validation(_) => "validation_error",
            Self::Configuration(_) => "configuration_error",
            Self::Storage(_) => "storage_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error: String,
    /// Human-readable error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "admin request failed");
        }
        let body = ErrorResponse {
            error: self.error_code().to_string(),
            error_description: Some(self.to_string()),
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for Admin API operations.
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_error() {
        let err = AdminError::not_found("AuthenticationFlow", "browser");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "not_found");
        assert!(err.to_string().contains("AuthenticationFlow"));
        assert!(err.to_string().contains("browser"));
    }

    #[test]
    fn conflict_errors() {
        let err = AdminError::conflict("AuthenticatorConfig", "alias", "foo");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "conflict");

        let err = AdminError::StateConflict("cannot delete built-in flow".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_error_mapping() {
        let admin_err = AdminError::from(StorageError::not_found("AuthenticationFlow", Uuid::nil()));
        assert_eq!(admin_err.status_code(), StatusCode::NOT_FOUND);

        let admin_err = AdminError::from(StorageError::in_use(
            "AuthenticationFlow",
            Uuid::nil(),
            "bound as browserFlow",
        ));
        assert_eq!(admin_err.status_code(), StatusCode::CONFLICT);

        let admin_err = AdminError::from(StorageError::Internal("disk".to_string()));
        assert_eq!(admin_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn configuration_error_is_distinct_from_validation() {
        let err = AdminError::Configuration("unknown provider 'x'".to_string());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "configuration_error");
    }
}
