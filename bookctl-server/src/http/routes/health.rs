//! Health check endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::server::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub environment: &'static str,
    pub version: &'static str,
}

/// GET /v1/healthcheck
async fn healthcheck(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "available",
        environment: state.environment.as_str(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/v1/healthcheck", get(healthcheck))
}
