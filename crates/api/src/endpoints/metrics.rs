//! Metrics endpoint.

use axum::{Router, routing::get};
use quorum_common::{AppResult, MetricsSnapshot, get_metrics};

use crate::{middleware::AppState, response::ApiResponse};

/// Current counter snapshot.
async fn snapshot() -> AppResult<ApiResponse<MetricsSnapshot>> {
    Ok(ApiResponse::ok(get_metrics().snapshot()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(snapshot))
}
