//! Error types for CorvidDB.

use thiserror::Error;

/// Result type alias using CorvidError.
pub type Result<T> = std::result::Result<T, CorvidError>;

/// Errors that can occur in CorvidDB operations.
#[derive(Debug, Error)]
pub enum CorvidError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Byte store / index errors
    #[error("Offset {offset} out of range (count {count})")]
    OutOfRange { offset: usize, count: usize },

    #[error("Index is read-only")]
    ReadOnly,

    #[error("Element not found")]
    NotFound,

    #[error("Store length {length} is not a multiple of item width {width}")]
    CorruptStore { length: u64, width: usize },

    // Cursor protocol errors
    #[error("Invalid cursor state: {0}")]
    InvalidState(String),

    #[error("A row mutation is already in progress")]
    AlreadyMutating,

    #[error("Not updatable: {0}")]
    NotUpdatable(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    // Table errors
    #[error("Row not found: {0}")]
    RowNotFound(u64),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    // Catalog errors
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CorvidError {
    /// Returns true for errors raised because a protocol call arrived in the
    /// wrong mutation state. `AlreadyMutating` is the narrower form of this.
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            CorvidError::InvalidState(_) | CorvidError::AlreadyMutating
        )
    }

    /// Returns true for errors that indicate a caller bug rather than a data
    /// condition.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CorvidError::OutOfRange { .. }
                | CorvidError::ReadOnly
                | CorvidError::InvalidState(_)
                | CorvidError::AlreadyMutating
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_conversion() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: CorvidError = io_err.into();
        assert!(matches!(err, CorvidError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_out_of_range_display() {
        let err = CorvidError::OutOfRange {
            offset: 7,
            count: 3,
        };
        assert_eq!(err.to_string(), "Offset 7 out of range (count 3)");
    }

    #[test]
    fn test_corrupt_store_display() {
        let err = CorvidError::CorruptStore {
            length: 13,
            width: 8,
        };
        assert_eq!(
            err.to_string(),
            "Store length 13 is not a multiple of item width 8"
        );
    }

    #[test]
    fn test_protocol_errors_display() {
        assert_eq!(
            CorvidError::AlreadyMutating.to_string(),
            "A row mutation is already in progress"
        );
        assert_eq!(
            CorvidError::InvalidState("no pending row".to_string()).to_string(),
            "Invalid cursor state: no pending row"
        );
        assert_eq!(
            CorvidError::NotUpdatable("upper(name)".to_string()).to_string(),
            "Not updatable: upper(name)"
        );
        assert_eq!(
            CorvidError::ConstraintViolation("name is null".to_string()).to_string(),
            "Constraint violation: name is null"
        );
    }

    #[test]
    fn test_already_mutating_is_invalid_state() {
        assert!(CorvidError::AlreadyMutating.is_invalid_state());
        assert!(CorvidError::InvalidState(String::new()).is_invalid_state());
        assert!(!CorvidError::NotFound.is_invalid_state());
        assert!(!CorvidError::ReadOnly.is_invalid_state());
    }

    #[test]
    fn test_caller_errors() {
        assert!(CorvidError::ReadOnly.is_caller_error());
        assert!(CorvidError::OutOfRange { offset: 0, count: 0 }.is_caller_error());
        assert!(!CorvidError::NotFound.is_caller_error());
        assert!(!CorvidError::ConstraintViolation(String::new()).is_caller_error());
    }

    #[test]
    fn test_catalog_errors_display() {
        let err = CorvidError::ColumnNotFound("email".to_string());
        assert_eq!(err.to_string(), "Column not found: email");

        let err = CorvidError::IndexNotFound("idx_users_email".to_string());
        assert_eq!(err.to_string(), "Index not found: idx_users_email");

        let err = CorvidError::RowNotFound(42);
        assert_eq!(err.to_string(), "Row not found: 42");
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = CorvidError::TypeMismatch {
            expected: "INT64".to_string(),
            actual: "VARCHAR".to_string(),
        };
        assert_eq!(err.to_string(), "Type mismatch: expected INT64, got VARCHAR");
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(CorvidError::Internal("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CorvidError>();
    }
}
