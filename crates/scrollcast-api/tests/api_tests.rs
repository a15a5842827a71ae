//! API integration tests.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use scrollcast_api::{create_router, ApiConfig, AppState};

/// Router backed by throwaway work directories.
async fn test_app(dir: &tempfile::TempDir) -> axum::Router {
    let config = ApiConfig {
        upload_dir: dir.path().join("uploads"),
        output_dir: dir.path().join("output"),
        ..ApiConfig::default()
    };

    let state = AppState::new(config).await.unwrap();
    create_router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_progress_unknown_job_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/progress/no-such-job")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_unknown_job_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/jobs/no-such-job/cancel")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_rejects_traversal_names() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    // Encoded slash so the name reaches the handler as one path segment
    let response = app
        .oneshot(
            Request::builder()
                .uri("/download/..%2F..%2Fetc%2Fpasswd")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_unknown_artifact_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/download/final_0a1b2c3d.mp4")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_serves_artifact_as_attachment() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let path = dir.path().join("output").join("final_00c0ffee.mp4");
    tokio::fs::write(&path, b"not really mp4").await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/download/final_00c0ffee.mp4")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "video/mp4"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("final_00c0ffee.mp4"));
}

#[tokio::test]
async fn test_generate_missing_fields_returns_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let boundary = "----scrollcast-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"text\"\r\n\r\n\
         Hello world\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/generate")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("scroll_speed"));
}

#[tokio::test]
async fn test_generate_rejects_bad_color() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let boundary = "----scrollcast-test-boundary";
    let fields = [
        ("text", "Hello world"),
        ("scroll_speed", "50"),
        ("font_size", "40"),
        ("main_color", "not-a-color"),
    ];
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
             {value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/generate")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("main_color"));
}

#[tokio::test]
async fn test_rejected_request_removes_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    // A saved background upload followed by an invalid color field
    let boundary = "----scrollcast-test-boundary";
    let mut body = String::new();
    body.push_str(&format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"background\"; filename=\"bg.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         not-actually-a-jpeg\r\n"
    ));
    for (name, value) in [
        ("text", "Hello world"),
        ("scroll_speed", "50"),
        ("font_size", "40"),
        ("main_color", "not-a-color"),
    ] {
        body.push_str(&format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
             {value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/generate")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The rejected request's upload must be gone
    let mut entries = tokio::fs::read_dir(dir.path().join("uploads")).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_cors_preflight() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/generate")
                .header("Origin", "http://localhost:3000")
                .header("Access-Control-Request-Method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::OK || response.status() == StatusCode::NO_CONTENT
    );
}
