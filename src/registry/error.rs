use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{PasswordError, TokenError};
use crate::storage::DatabaseError;

/// A single problem with a request, optionally tied to an input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// An error about the request as a whole
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Authentication missing or rejected, optionally naming the bad credential
    #[error("Unauthenticated")]
    Auth(Option<FieldError>),
    #[error("{}", .0.message)]
    Conflict(FieldError),
    #[error("Forbidden")]
    Forbidden,
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Not found")]
    NotFound,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
}

impl ServiceError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn unauthenticated(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Auth(Some(FieldError::new(field, message)))
    }
}

/// Fold the outcome of independently checked fields into one validation
/// error listing every failure.
pub fn violations<const N: usize>(checks: [Option<FieldError>; N]) -> ServiceError {
    ServiceError::Validation(checks.into_iter().flatten().collect())
}

impl From<DatabaseError> for ServiceError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Conflict { field } => {
                ServiceError::Conflict(FieldError::new(field, format!("{field} is already taken")))
            }
            e => {
                tracing::error!(error = %e, "Storage operation failed");
                ServiceError::Storage(e.to_string())
            }
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        tracing::error!(error = %e, "Upload storage operation failed");
        ServiceError::Storage(e.to_string())
    }
}

impl From<PasswordError> for ServiceError {
    fn from(e: PasswordError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

impl From<TokenError> for ServiceError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Encoding(msg) => ServiceError::Internal(msg),
            e => ServiceError::Auth(Some(FieldError::general(e.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violations_keeps_only_failures() {
        let err = violations([
            Some(FieldError::new("title", "Title is required")),
            None,
            Some(FieldError::new("price", "Price is required")),
        ]);

        let ServiceError::Validation(errors) = err else {
            panic!("expected a validation error");
        };
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field.as_deref()).collect();
        assert_eq!(fields, ["title", "price"]);
    }

    #[test]
    fn test_conflict_maps_from_database() {
        let err = ServiceError::from(DatabaseError::Conflict { field: "email" });
        assert!(
            matches!(err, ServiceError::Conflict(FieldError { field: Some(ref f), .. }) if f == "email")
        );
    }
}
