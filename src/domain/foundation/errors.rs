//! Error types shared across the domain layer.

use thiserror::Error;

/// Errors surfaced by ports and domain operations.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("Field '{field}' is invalid: {reason}")]
    Validation { field: String, reason: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        DomainError::NotFound { entity }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn storage(reason: impl Into<String>) -> Self {
        DomainError::Storage(reason.into())
    }

    pub fn provider(reason: impl Into<String>) -> Self {
        DomainError::Provider(reason.into())
    }
}
