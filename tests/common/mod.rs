//! Shared helpers for integration tests.

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use tempfile::TempDir;

use darkserve::{routes, AppState, Config};

pub const BODY_LIMIT: usize = 1024 * 1024;

/// Router plus the state behind it, serving the temp directory.
pub fn test_app(root: &TempDir) -> (Router, AppState) {
    test_app_with_config(root, Config::default())
}

pub fn test_app_with_config(root: &TempDir, config: Config) -> (Router, AppState) {
    let root_dir = root.path().canonicalize().unwrap();
    let state = AppState::new(root_dir, config);
    (routes::router(state.clone()), state)
}

/// Plain GET request for `uri`.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::GET)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Content-Type header as a string, empty when absent.
pub fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// A root with a 10 byte index.html and an empty subdirectory.
pub fn seed_basic_root(root: &TempDir) {
    std::fs::write(root.path().join("index.html"), "0123456789").unwrap();
    std::fs::create_dir(root.path().join("empty")).unwrap();
}
