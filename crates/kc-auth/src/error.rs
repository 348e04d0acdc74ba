//! Authentication engine error types.
//!
//! An authentication FAILURE is a verdict, not an error. The variants here
//! cover the cases where no verdict can be produced at all.

use std::fmt;

use kc_storage::StorageError;

/// Authentication engine errors.
#[derive(Debug)]
pub enum AuthError {
    /// The flow definition cannot be evaluated as stored: a dangling
    /// provider or flow id, a sub-flow execution without a target, a
    /// provider used as the wrong kind, a missing bound config, nesting
    /// deeper than allowed, or a suspended execution that no longer exists.
    Configuration(String),
    /// The resume cursor does not describe a suspension point of its flow.
    InvalidCursor(String),
    /// The flow definition store failed.
    Storage(String),
    /// An authenticator failed internally.
    Internal(String),
}

impl AuthError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Checks if the flow definition itself is at fault.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Checks if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "authentication flow misconfigured: {msg}"),
            Self::InvalidCursor(msg) => write!(f, "invalid resume cursor: {msg}"),
            Self::Storage(msg) => write!(f, "flow store error: {msg}"),
            Self::Internal(msg) => write!(f, "internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn error_display() {
        let err = AuthError::configuration("unknown provider 'x'");
        assert_eq!(
            err.to_string(),
            "authentication flow misconfigured: unknown provider 'x'"
        );

        let err = AuthError::InvalidCursor("no frames".to_string());
        assert!(err.to_string().contains("cursor"));
    }

    #[test]
    fn classification() {
        assert!(AuthError::configuration("x").is_configuration_error());
        assert!(!AuthError::Internal("x".to_string()).is_configuration_error());

        let err: AuthError = StorageError::not_found("AuthenticationFlow", Uuid::nil()).into();
        assert!(err.is_retryable());
        assert!(!err.is_configuration_error());
    }
}
