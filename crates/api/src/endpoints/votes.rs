//! Vote endpoints.
//!
//! The producing side of the vote ledger: the handlers confirm the target
//! exists, drive the ledger, and dispatch the vote-received notification to
//! the target's author.

use axum::{Json, Router, extract::State, routing::post};
use quorum_common::{AppError, AppResult};
use quorum_core::{Direction, NewNotification, ScoreResult};
use quorum_db::entities::{notification::NotificationKind, vote::TargetKind};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Cast vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub target_kind: TargetKind,
    pub target_id: String,
    pub direction: Direction,
}

/// Cast (or re-cast) a vote on a question or answer.
async fn cast(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<ApiResponse<ScoreResult>> {
    // The ledger's precondition: the target must exist
    let author_id = state
        .targets
        .author_of(req.target_kind, &req.target_id)
        .await?
        .ok_or_else(|| AppError::TargetNotFound(req.target_id.clone()))?;

    let result = state
        .vote_service
        .cast_vote(&user.id, req.target_kind, &req.target_id, req.direction)
        .await?;

    // Notify the target's author (never for self-votes). The vote is already
    // committed; a failed dispatch is logged, not surfaced.
    if author_id != user.id
        && let Err(e) = state
            .dispatcher
            .dispatch(vote_notification(&user.id, author_id, &req))
            .await
    {
        tracing::warn!(error = %e, "Failed to dispatch vote notification");
    }

    Ok(ApiResponse::ok(result))
}

fn vote_notification(voter_id: &str, author_id: String, req: &CastVoteRequest) -> NewNotification {
    let kind = match req.direction {
        Direction::Up => NotificationKind::Upvote,
        Direction::Down => NotificationKind::Downvote,
    };
    let noun = match req.target_kind {
        TargetKind::Question => "question",
        TargetKind::Answer => "answer",
    };
    let verb = match req.direction {
        Direction::Up => "an upvote",
        Direction::Down => "a downvote",
    };

    NewNotification {
        recipient_id: author_id,
        actor_id: Some(voter_id.to_string()),
        kind,
        message: format!("Your {noun} received {verb}"),
        link: Some(format!(
            "/{}/{}",
            req.target_kind.path_segment(),
            req.target_id
        )),
    }
}

/// Remove vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveVoteRequest {
    pub target_kind: TargetKind,
    pub target_id: String,
}

/// Remove the caller's vote from a target.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RemoveVoteRequest>,
) -> AppResult<ApiResponse<ScoreResult>> {
    if !state.targets.exists(req.target_kind, &req.target_id).await? {
        return Err(AppError::TargetNotFound(req.target_id));
    }

    let result = state
        .vote_service
        .remove_vote(&user.id, req.target_kind, &req.target_id)
        .await?;

    Ok(ApiResponse::ok(result))
}

/// Vote state request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStateRequest {
    pub target_kind: TargetKind,
    pub target_id: String,
}

/// Vote state response: the annotation rendering collaborators ask for.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStateResponse {
    pub score: i64,
    pub upvotes: u64,
    pub downvotes: u64,
    /// The caller's own vote; absent for anonymous reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_vote: Option<Direction>,
}

/// Current score and the caller's own vote on a target.
async fn vote_state(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<VoteStateRequest>,
) -> AppResult<ApiResponse<VoteStateResponse>> {
    if !state.targets.exists(req.target_kind, &req.target_id).await? {
        return Err(AppError::TargetNotFound(req.target_id));
    }

    let score = state
        .score_projector
        .breakdown(req.target_kind, &req.target_id)
        .await?;

    let my_vote = match user {
        Some(user) => {
            state
                .vote_service
                .get_user_vote(&user.id, req.target_kind, &req.target_id)
                .await?
        }
        None => None,
    };

    Ok(ApiResponse::ok(VoteStateResponse {
        score: score.value(),
        upvotes: score.upvotes,
        downvotes: score.downvotes,
        my_vote,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cast", post(cast))
        .route("/remove", post(remove))
        .route("/state", post(vote_state))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_request_deserializes_camel_case() {
        let req: CastVoteRequest = serde_json::from_str(
            r#"{"targetKind": "question", "targetId": "q1", "direction": "up"}"#,
        )
        .unwrap();

        assert_eq!(req.target_kind, TargetKind::Question);
        assert_eq!(req.target_id, "q1");
        assert_eq!(req.direction, Direction::Up);
    }

    #[test]
    fn test_vote_notification_downvote_on_answer() {
        let req = CastVoteRequest {
            target_kind: TargetKind::Answer,
            target_id: "a1".to_string(),
            direction: Direction::Down,
        };

        let notification = vote_notification("voter1", "author1".to_string(), &req);

        assert_eq!(notification.recipient_id, "author1");
        assert_eq!(notification.actor_id.as_deref(), Some("voter1"));
        assert_eq!(notification.kind, NotificationKind::Downvote);
        assert_eq!(notification.message, "Your answer received a downvote");
        assert_eq!(notification.link.as_deref(), Some("/answers/a1"));
    }
}
