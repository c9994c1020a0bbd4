use std::fs;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tempfile::TempDir;
use tower::ServiceExt;

use super::*;

fn dist() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<html><body>bookmarks</body></html>").unwrap();
    fs::create_dir(dir.path().join("assets")).unwrap();
    fs::write(dir.path().join("assets").join("app.js"), "console.log('ready');").unwrap();
    dir
}

async fn get(dir: &TempDir, uri: &str) -> (StatusCode, Option<String>, String) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let response = app(dir.path()).oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn root_serves_index_html() {
    let dir = dist();
    let (status, content_type, body) = get(&dir, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert!(body.contains("bookmarks"));
}

#[tokio::test]
async fn serves_nested_asset() {
    let dir = dist();
    let (status, content_type, body) = get(&dir, "/assets/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().contains("javascript"));
    assert_eq!(body, "console.log('ready');");
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let dir = dist();
    let (status, _, _) = get(&dir, "/nope.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn no_api_surface() {
    let dir = dist();
    let (status, _, _) = get(&dir, "/api/bookmarks").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn path_traversal_is_rejected() {
    let dir = dist();
    let (status, _, _) = get(&dir, "/../Cargo.toml").await;
    assert_ne!(status, StatusCode::OK);
}
