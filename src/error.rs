//! Error types for the fraud detection pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, FraudError>;

/// Main error type for the fraud detection service
#[derive(Error, Debug)]
pub enum FraudError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("File too large. Maximum size is {limit_mb}MB")]
    FileTooLarge { limit_mb: u64 },

    #[error("No trained model available. Please upload and process data first.")]
    NotReady,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for FraudError {
    fn from(err: polars::error::PolarsError) -> Self {
        FraudError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for FraudError {
    fn from(err: serde_json::Error) -> Self {
        FraudError::PersistenceError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for FraudError {
    fn from(err: ndarray::ShapeError) -> Self {
        FraudError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FraudError::DataError("missing Class column".to_string());
        assert_eq!(err.to_string(), "Data error: missing Class column");
    }

    #[test]
    fn test_file_too_large_states_limit() {
        let err = FraudError::FileTooLarge { limit_mb: 100 };
        assert!(err.to_string().contains("100MB"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FraudError = io_err.into();
        assert!(matches!(err, FraudError::Io(_)));
    }
}
