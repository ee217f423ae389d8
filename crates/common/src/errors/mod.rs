//! Error types for Colloquia services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - A clean validation/conflict split: validation errors are rejected
//!   before any mutation and are safe to retry after correcting input
//! - Structured context (entity kind, id) on lookup failures

use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Cannot merge {entity_kind} into itself")]
    SelfMerge { entity_kind: &'static str },

    #[error("Setting this parent would create a cycle in the session tree of work {work_id}")]
    SessionCycle { work_id: uuid::Uuid },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: &'static str, id: String },

    // Conflict errors
    #[error("Duplicate resource: {message}")]
    Duplicate { message: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a validation failure with a free-form reason.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation { message: message.into() }
    }

    /// Shorthand for a missing entity lookup.
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        AppError::NotFound { resource_type, id: id.to_string() }
    }

    /// Validation errors are rejected before any mutation and are safe to
    /// retry once the input is corrected.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. }
                | AppError::MissingField { .. }
                | AppError::SelfMerge { .. }
                | AppError::SessionCycle { .. }
                | AppError::NotFound { .. }
        )
    }

    /// Conflict and store errors abort the surrounding transaction.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Duplicate { .. } | AppError::Database(_))
    }
}

/// Unwrap a SeaORM transaction error back into the domain error.
///
/// `sea_orm::TransactionError` wraps either a connection-level failure or
/// the error returned by the closure; both collapse into `AppError`.
impl From<sea_orm::TransactionError<AppError>> for AppError {
    fn from(err: sea_orm::TransactionError<AppError>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(e) => AppError::Database(e),
            sea_orm::TransactionError::Transaction(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_merge_is_validation() {
        let err = AppError::SelfMerge { entity_kind: "author" };
        assert!(err.is_validation());
        assert!(!err.is_conflict());
        assert_eq!(err.to_string(), "Cannot merge author into itself");
    }

    #[test]
    fn test_not_found_context() {
        let id = uuid::Uuid::new_v4();
        let err = AppError::not_found("institution", id);
        assert!(err.to_string().contains("institution"));
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_duplicate_is_conflict() {
        let err = AppError::Duplicate { message: "appellation already exists".into() };
        assert!(err.is_conflict());
        assert!(!err.is_validation());
    }
}
