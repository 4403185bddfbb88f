//! Error types for mnemo operations.
//!
//! Provides a structured error hierarchy with error codes for programmatic
//! handling. Engines never swallow repository errors; they propagate them to
//! the caller, which owns user-visible messaging.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for mnemo operations.
pub type MnemoResult<T> = Result<T, MnemoError>;

/// Main error type for all mnemo operations.
#[derive(Error, Debug)]
pub enum MnemoError {
    /// Input validation failed. Rejected before any write; never retried
    /// automatically.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
    },

    /// Study item not found.
    #[error("Item not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        item_id: Option<Uuid>,
    },

    /// Underlying persistence failure.
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Caller contract violation (e.g. out-of-range quality rating).
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        message: String,
        code: ErrorCode,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,

    // Item (ITEM_xxx)
    ItemNotFound,

    // Storage (STORE_xxx)
    StoreOperationFailed,
    StoreConnectionFailed,

    // Scheduler (SCHED_xxx)
    SchedInvalidQuality,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ItemNotFound => "ITEM_001",
            ErrorCode::StoreOperationFailed => "STORE_001",
            ErrorCode::StoreConnectionFailed => "STORE_002",
            ErrorCode::SchedInvalidQuality => "SCHED_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl MnemoError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
        }
    }

    /// Create a validation error for a missing required field.
    pub fn missing_field(field: &str) -> Self {
        Self::Validation {
            message: format!("Required field '{}' is empty", field),
            code: ErrorCode::ValMissingField,
        }
    }

    /// Create a not found error.
    pub fn not_found(item_id: Uuid) -> Self {
        Self::NotFound {
            message: format!("Study item '{}' not found", item_id),
            code: ErrorCode::ItemNotFound,
            item_id: Some(item_id),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoreOperationFailed,
            source: None,
        }
    }

    /// Create a storage error wrapping an underlying cause.
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoreOperationFailed,
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
        }
    }

    /// Create an invalid quality rating error.
    pub fn invalid_quality(quality: u8) -> Self {
        Self::InvalidArgument {
            message: format!("Quality rating {} is out of range 0..=5", quality),
            code: ErrorCode::SchedInvalidQuality,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Storage { code, .. } => *code,
            Self::InvalidArgument { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether this error indicates a missing record (stale reference).
    ///
    /// Typical recovery is to refresh the view and drop the reference.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = MnemoError::validation("empty title");
        assert_eq!(err.code(), ErrorCode::ValInvalidInput);
        assert!(err.to_string().contains("empty title"));
    }

    #[test]
    fn test_not_found_error() {
        let id = Uuid::new_v4();
        let err = MnemoError::not_found(id);
        assert_eq!(err.code(), ErrorCode::ItemNotFound);
        assert!(err.is_not_found());
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_invalid_quality_code() {
        let err = MnemoError::invalid_quality(9);
        assert_eq!(err.code(), ErrorCode::SchedInvalidQuality);
        assert_eq!(err.code().as_str(), "SCHED_001");
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = MnemoError::storage_with_source("write failed", io);
        assert_eq!(err.code(), ErrorCode::StoreOperationFailed);
        assert!(std::error::Error::source(&err).is_some());
    }
}
