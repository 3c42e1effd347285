//! Axum router wiring plus the response-counting middleware.

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::app_state::AppState;
use crate::ops;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(ops::metrics))
        .route("/counters.json", get(ops::counters_json))
        .route("/healthz", get(ops::healthz))
        .route("/echo/:code", get(ops::echo))
        .fallback(ops::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            count_responses,
        ))
        .with_state(state)
}

/// Record the outcome of every completed response, exactly once, after the
/// handler ran. Recording failures are logged and never fail the request.
pub async fn count_responses(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let code = response.status().as_u16();
    if let Err(error) = state.store().increment(code) {
        tracing::warn!(%error, code, "failed to record response outcome");
    }
    response
}
