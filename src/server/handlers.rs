//! HTTP request handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde_json::json;
use tracing::info;

use super::error::{Result, ServerError};
use super::state::AppState;
use crate::error::FraudError;
use crate::pipeline::{CurrentModelResponse, PredictionResponse, UploadReport};

/// Upload a dataset and train a new model on it
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadReport>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;

        info!(file = %file_name, bytes = content.len(), "received upload");

        // Training is CPU-bound, keep it off the async workers
        let state = Arc::clone(&state);
        let report = tokio::task::spawn_blocking(move || {
            state.pipeline.run_upload(&file_name, &content)
        })
        .await
        .map_err(|e| ServerError::Pipeline(FraudError::TrainingError(e.to_string())))??;

        return Ok(Json(report));
    }

    Err(ServerError::BadRequest("No file uploaded".to_string()))
}

/// Score a single transaction record
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(record): Json<HashMap<String, serde_json::Value>>,
) -> Result<Json<PredictionResponse>> {
    let response = state.pipeline.predict(&record)?;
    Ok(Json(response))
}

/// Describe the model currently serving predictions
pub async fn get_current_model(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CurrentModelResponse>> {
    let response = state.pipeline.describe_current_model()?;
    Ok(Json(response))
}

/// Graphs are only produced inline with an upload
pub async fn get_graph(Path(_graph_type): Path<String>) -> Result<Json<serde_json::Value>> {
    Err(ServerError::BadRequest(
        "Graphs are generated during file upload. Please upload a file first.".to_string(),
    ))
}

/// Liveness check
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "model_loaded": state.pipeline.slot().is_loaded(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
