//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use std::sync::Arc;

use quorum_core::{
    NotificationDispatcher, NotificationService, PresenceRegistry, ScoreProjector,
    TargetDirectory, VoteService,
};

use crate::auth::TokenVerifier;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub vote_service: VoteService,
    pub score_projector: ScoreProjector,
    pub notification_service: NotificationService,
    pub dispatcher: NotificationDispatcher,
    pub presence: Arc<PresenceRegistry>,
    pub targets: TargetDirectory,
    pub token_verifier: TokenVerifier,
}

/// Authentication middleware.
///
/// Validates the bearer token when present and stashes the identity in the
/// request extensions; endpoints decide whether identity is required.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.token_verifier.verify(token)
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
