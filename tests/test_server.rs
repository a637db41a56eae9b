//! Integration test: Server API endpoints

use std::fmt::Write as _;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use fraudguard::server::{create_router, AppState};
use fraudguard::Settings;
use tower::ServiceExt;

const BOUNDARY: &str = "fraudguard-test-boundary";

struct TestServer {
    _dir: tempfile::TempDir,
    state: Arc<AppState>,
}

impl TestServer {
    fn new() -> Self {
        Self::with_settings(|_| {})
    }

    fn with_settings(tweak: impl FnOnce(&mut Settings)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_upload_size: 10 * 1024 * 1024,
            upload_dir: dir.path().join("uploads").to_string_lossy().to_string(),
            model_dir: dir.path().join("models").to_string_lossy().to_string(),
            sample_large_datasets: false,
            large_dataset_threshold: 100_000,
            sample_cap: 50_000,
            enable_smote: false,
            max_smote_samples: 100_000,
            test_size: 0.25,
            random_seed: 42,
            cors_origin: "*".to_string(),
            enable_compression: true,
            compression_min_size: 1000,
            allowed_hosts: vec!["*".to_string()],
            chart_sample_cap: 50_000,
        };
        tweak(&mut settings);
        Self {
            _dir: dir,
            state: Arc::new(AppState::new(settings)),
        }
    }

    fn app(&self) -> axum::Router {
        create_router(Arc::clone(&self.state))
    }
}

fn csv_dataset(n_genuine: usize, n_fraud: usize) -> String {
    let mut out = String::from("Time,Amount,Class\n");
    for i in 0..n_genuine {
        writeln!(out, "{}.0,{}.5,0", i, 10 + 3 * i).unwrap();
    }
    for i in 0..n_fraud {
        writeln!(out, "{}.0,{}.5,1", 1000 + i, 500 + 7 * i).unwrap();
    }
    out
}

fn multipart_upload(filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new();
    let response = server
        .app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["model_loaded"], false);
}

#[tokio::test]
async fn test_predict_without_model_is_400() {
    let server = TestServer::new();
    let response = server
        .app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"Time": 1.0, "Amount": 10.0}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["message"],
        "No trained model available. Please upload and process data first."
    );
}

#[tokio::test]
async fn test_current_model_without_model_is_404() {
    let server = TestServer::new();
    let response = server
        .app()
        .oneshot(
            Request::builder()
                .uri("/api/models/current")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_graphs_endpoint_always_400() {
    let server = TestServer::new();
    let response = server
        .app()
        .oneshot(
            Request::builder()
                .uri("/api/graphs/class_distribution")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["message"],
        "Graphs are generated during file upload. Please upload a file first."
    );
}

#[tokio::test]
async fn test_upload_then_predict_and_inspect() {
    let server = TestServer::new();

    let response = server
        .app()
        .oneshot(multipart_upload("transactions.csv", &csv_dataset(12, 4)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["status"], "success");
    assert_eq!(report["data"]["processed_rows"], 16);
    let model_id = report["model_id"].as_str().unwrap().to_string();

    let response = server
        .app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"Time": 2.0, "Amount": 16.5}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let prediction = body_json(response).await;
    assert_eq!(prediction["status"], "success");
    assert!(prediction["probability"].as_f64().unwrap() <= 1.0);

    let response = server
        .app()
        .oneshot(
            Request::builder()
                .uri("/api/models/current")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let current = body_json(response).await;
    assert_eq!(current["model_id"], model_id.as_str());
    assert_eq!(current["model_type"], "RandomForestClassifier");
}

#[tokio::test]
async fn test_upload_without_file_field_is_400() {
    let server = TestServer::new();
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
    );
    let response = server
        .app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_single_class_upload_with_smote_is_400() {
    let server = TestServer::with_settings(|s| s.enable_smote = true);

    let response = server
        .app()
        .oneshot(multipart_upload("all_genuine.csv", &csv_dataset(12, 0)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], true);
}

#[tokio::test]
async fn test_disallowed_host_is_rejected() {
    let server =
        TestServer::with_settings(|s| s.allowed_hosts = vec!["fraudguard.local".to_string()]);

    let response = server
        .app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header(header::HOST, "evil.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid host header");

    let response = server
        .app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header(header::HOST, "fraudguard.local:8000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let server = TestServer::new();
    let response = server
        .app()
        .oneshot(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
