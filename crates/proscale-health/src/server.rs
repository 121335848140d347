//! HTTP health transport.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::tracker::HealthInfo;

/// Build the health routes over a shared [`HealthInfo`].
pub fn health_router(health: Arc<HealthInfo>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/last-poll", get(last_poll))
        .route("/status", get(status))
        .with_state(health)
}

/// GET /healthz
async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// GET /last-poll
async fn last_poll(State(health): State<Arc<HealthInfo>>) -> impl IntoResponse {
    match health.last_error() {
        Some(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Encountered error at last poll cycle: {e}"),
        )
            .into_response(),
        None => StatusCode::OK.into_response(),
    }
}

/// GET /status
async fn status(State(health): State<Arc<HealthInfo>>) -> impl IntoResponse {
    Json(health.snapshot())
}
