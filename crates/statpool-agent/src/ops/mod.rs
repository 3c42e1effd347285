//! Operational HTTP endpoints.
//!
//! - `/healthz`       : liveness
//! - `/metrics`       : counter table in the text exposition format
//! - `/counters.json` : the same snapshot as JSON
//! - `/echo/:code`    : responds with exactly that status (traffic source)

use axum::extract::{Path, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use statpool_core::export;

use crate::app_state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Explicit fallback so unmatched paths flow through the counting layer too.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found\n")
}

pub async fn metrics(method: Method, State(state): State<AppState>) -> Response {
    // Header-only queries return metadata without touching the table.
    if method == Method::HEAD {
        return ([(header::CONTENT_TYPE, export::CONTENT_TYPE)], ()).into_response();
    }

    match state.store().snapshot() {
        Ok(snapshot) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, export::CONTENT_TYPE)],
            export::render(&snapshot),
        )
            .into_response(),
        Err(error) => {
            tracing::error!(%error, "metrics snapshot failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn counters_json(State(state): State<AppState>) -> Response {
    match state.store().snapshot() {
        Ok(snapshot) => {
            let body = serde_json::json!({
                "total": snapshot.total(),
                "counters": snapshot.entries().collect::<Vec<_>>(),
            });
            Json(body).into_response()
        }
        Err(error) => {
            tracing::error!(%error, "counters snapshot failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Respond with exactly the requested final status code.
pub async fn echo(Path(code): Path<u16>) -> Response {
    if !(200..=599).contains(&code) {
        return (StatusCode::BAD_REQUEST, "status code out of range\n").into_response();
    }
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}\n")).into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, "status code out of range\n").into_response(),
    }
}
