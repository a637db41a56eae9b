//! API route definitions

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, StatusCode},
    middleware as axum_middleware,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    compression::{predicate::SizeAbove, CompressionLayer},
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers, state::AppState};

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "message": "Not found. Check /api/health for API status.",
        })),
    )
}

async fn handle_405() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": true,
            "message": "Method not allowed. Check the API documentation for supported methods.",
        })),
    )
}

/// Reject requests whose Host header is not on the allow list
async fn enforce_allowed_hosts(
    State(allowed): State<Arc<Vec<String>>>,
    request: Request,
    next: Next,
) -> Response {
    if allowed.iter().any(|h| h == "*") {
        return next.run(request).await;
    }

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|h| h.split(':').next().unwrap_or(h).to_string());

    match host {
        Some(h) if allowed.iter().any(|a| a.eq_ignore_ascii_case(&h)) => next.run(request).await,
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": true,
                "message": "Invalid host header",
            })),
        )
            .into_response(),
    }
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/upload", post(handlers::upload_file))
        .route("/predict", post(handlers::predict))
        .route("/models/current", get(handlers::get_current_model))
        .route("/graphs/:graph_type", get(handlers::get_graph))
        .route("/health", get(handlers::health_check))
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405);

    // The body limit sits above the configured maximum so oversized
    // uploads reach the pipeline's own size check and get its message
    let body_limit = state.settings().max_upload_size + 1024 * 1024;
    let allowed_hosts = Arc::new(state.settings().allowed_hosts.clone());
    let enable_compression = state.settings().enable_compression;
    let compression_min_size = state.settings().compression_min_size;

    let cors = match state.settings().cors_origin.as_str() {
        origin if !origin.is_empty() && origin != "*" => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<axum::http::HeaderValue>()
                    .unwrap_or_else(|_| axum::http::HeaderValue::from_static("*")),
            )
            .allow_methods(Any)
            .allow_headers(Any),
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        .nest("/api", api_routes)
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405)
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            allowed_hosts,
            enforce_allowed_hosts,
        ))
        .layer(DefaultBodyLimit::max(body_limit));

    let app = if enable_compression {
        app.layer(CompressionLayer::new().compress_when(SizeAbove::new(compression_min_size)))
    } else {
        app
    };

    app.layer(cors).layer(TraceLayer::new_for_http())
}
