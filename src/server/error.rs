//! Error types for the server

use crate::error::FraudError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] FraudError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Pipeline(err) => match err {
                FraudError::DataError(_)
                | FraudError::ValidationError(_)
                | FraudError::FileTooLarge { .. }
                | FraudError::NotReady
                | FraudError::ModelNotFitted
                | FraudError::ShapeError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
                FraudError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                FraudError::TrainingError(msg) => {
                    tracing::error!(detail = %msg, "Training error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Training failed. Check server logs for details.".to_string(),
                    )
                }
                FraudError::PersistenceError(msg) => {
                    tracing::error!(detail = %msg, "Persistence error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to persist model artifacts.".to_string(),
                    )
                }
                FraudError::Io(e) => {
                    tracing::error!(detail = %e, "IO error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "A file system error occurred".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_upload_maps_to_400() {
        let response =
            ServerError::Pipeline(FraudError::FileTooLarge { limit_mb: 100 }).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_model_maps_to_404() {
        let response =
            ServerError::Pipeline(FraudError::NotFound("no model".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_training_failure_hides_detail() {
        let response =
            ServerError::Pipeline(FraudError::TrainingError("secret path".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
