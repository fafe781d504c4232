//! API endpoints.

mod metrics;
mod notifications;
mod votes;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/votes", votes::router())
        .nest("/notifications", notifications::router())
        .nest("/metrics", metrics::router())
}
