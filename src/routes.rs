use axum::{middleware, routing::get, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Assemble the application router.
///
/// Layer order, outermost first: request tracing, admission gate, panic
/// containment, routes. Admission wraps routing, so a gate slot is held
/// while a request is being classified and answered.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tcpstates", get(handlers::status))
        .fallback(handlers::serve_path)
        .layer(CatchPanicLayer::custom(handlers::handle_panic))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::admission,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
