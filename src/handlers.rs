use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, error};

use crate::error::ServeError;
use crate::gate;
use crate::listing;
use crate::resolve::{self, ResolvedTarget};
use crate::status::StatusPayload;
use crate::AppState;

/// GET /tcpstates - server status
///
/// Answered from process state alone; the filesystem is never touched.
pub async fn status() -> Result<Json<StatusPayload>, ServeError> {
    Ok(Json(StatusPayload::capture()?))
}

/// Fallback for every other path: classify it against the served root and
/// answer with a dark mode listing, the file content, or 404.
pub async fn serve_path(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, ServeError> {
    if req.method() != Method::GET {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let request_path = req.uri().path().to_owned();
    match resolve::resolve_request_path(&state.root_dir, &request_path) {
        ResolvedTarget::Missing => {
            debug!("{} not found under served root", request_path);
            Err(ServeError::NotFound)
        }
        ResolvedTarget::Directory(dir) => {
            let html = listing::render_directory(&state.root_dir, &dir).await?;
            Ok(Html(html).into_response())
        }
        ResolvedTarget::File(file) => {
            debug!("serving file {}", file.display());
            // Range, conditional and content-type handling belong to ServeFile.
            match ServeFile::new(&file).oneshot(req).await {
                Ok(response) => Ok(response.into_response()),
                Err(infallible) => match infallible {},
            }
        }
    }
}

/// Middleware holding one gate slot per request. The slot is acquired before
/// routing (waiting when the gate is saturated) and rides the response body
/// until the last byte is written; every response closes its connection.
pub async fn admission(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let permit = state.gate.acquire().await;
    debug!("request admitted, {} in flight", state.gate.in_flight());
    let response = next.run(req).await;
    gate::hold_until_sent(response, permit)
}

/// Last-resort translation of a handler panic into the 500 response shape.
pub fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected failure".to_string()
    };
    error!("request handler panicked: {detail}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Server error: {detail}"),
    )
        .into_response()
}
