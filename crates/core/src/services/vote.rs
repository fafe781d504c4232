//! Vote ledger service.
//!
//! Owns the (user, target) → vote mapping. One row per user per target; a
//! repeat cast flips or no-ops in place, never duplicates. The write path is
//! "try insert, on unique conflict update by the same tuple, once" — the
//! unique index serializes racing writers for a tuple.

use chrono::Utc;
use quorum_common::{AppError, AppResult, IdGenerator, get_metrics};
use quorum_db::{
    entities::vote::{self, TargetKind},
    repositories::{VoteInsert, VoteRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::services::score::ScoreProjector;

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Stored representation.
    #[must_use]
    pub const fn is_upvote(self) -> bool {
        matches!(self, Self::Up)
    }

    /// From the stored representation.
    #[must_use]
    pub const fn from_is_upvote(is_upvote: bool) -> Self {
        if is_upvote { Self::Up } else { Self::Down }
    }
}

/// Result of a ledger operation: the freshly recomputed score plus the
/// caller's own resulting vote.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: i64,
    pub upvotes: u64,
    pub downvotes: u64,
    pub my_vote: Option<Direction>,
}

/// What a cast has to do, given the row the caller read.
#[derive(Debug, PartialEq, Eq)]
enum CastPlan {
    /// No row yet: insert one.
    Insert,
    /// Row exists with the other direction: flip it in place.
    Flip,
    /// Row exists with this direction: idempotent re-click.
    Noop,
}

const fn plan_cast(existing: Option<bool>, requested: bool) -> CastPlan {
    match existing {
        None => CastPlan::Insert,
        Some(current) if current == requested => CastPlan::Noop,
        Some(_) => CastPlan::Flip,
    }
}

/// Vote ledger service.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: VoteRepository,
    projector: ScoreProjector,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository, projector: ScoreProjector) -> Self {
        Self {
            vote_repo,
            projector,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast (or re-cast) a vote on a target.
    ///
    /// Target existence is the caller's precondition. Returns the recomputed
    /// score; under concurrent voters it may not yet include their
    /// just-committed rows — the caller's own direction is always exact.
    pub async fn cast_vote(
        &self,
        user_id: &str,
        target_kind: TargetKind,
        target_id: &str,
        direction: Direction,
    ) -> AppResult<ScoreResult> {
        let is_upvote = direction.is_upvote();
        let existing = self
            .vote_repo
            .find_by_user_and_target(user_id, target_kind, target_id)
            .await?;

        match plan_cast(existing.map(|v| v.is_upvote), is_upvote) {
            CastPlan::Noop => {}
            CastPlan::Flip => {
                let rows = self
                    .vote_repo
                    .set_direction(user_id, target_kind, target_id, is_upvote)
                    .await?;
                if rows == 0 {
                    // The row was removed between our read and the flip
                    // (another session of this user); take the insert path.
                    self.insert_once(user_id, target_kind, target_id, is_upvote)
                        .await?;
                }
            }
            CastPlan::Insert => {
                self.insert_once(user_id, target_kind, target_id, is_upvote)
                    .await?;
            }
        }

        get_metrics().record_vote_cast();
        self.result(target_kind, target_id, Some(direction)).await
    }

    /// Remove a user's vote from a target. No-op when absent.
    pub async fn remove_vote(
        &self,
        user_id: &str,
        target_kind: TargetKind,
        target_id: &str,
    ) -> AppResult<ScoreResult> {
        self.vote_repo
            .delete_by_user_and_target(user_id, target_kind, target_id)
            .await?;

        get_metrics().record_vote_removed();
        self.result(target_kind, target_id, None).await
    }

    /// The caller's current vote on a target, if any.
    pub async fn get_user_vote(
        &self,
        user_id: &str,
        target_kind: TargetKind,
        target_id: &str,
    ) -> AppResult<Option<Direction>> {
        Ok(self
            .vote_repo
            .find_by_user_and_target(user_id, target_kind, target_id)
            .await?
            .map(|v| Direction::from_is_upvote(v.is_upvote)))
    }

    /// Insert, falling back to the tuple-keyed update on a unique conflict.
    ///
    /// The fallback runs exactly once. A second conflict means a third writer
    /// raced both attempts for one logical user identity, which the protocol
    /// treats as an invariant breach rather than retrying further.
    async fn insert_once(
        &self,
        user_id: &str,
        target_kind: TargetKind,
        target_id: &str,
        is_upvote: bool,
    ) -> AppResult<()> {
        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            target_kind: Set(target_kind),
            target_id: Set(target_id.to_string()),
            is_upvote: Set(is_upvote),
            created_at: Set(Utc::now().into()),
        };

        match self.vote_repo.try_insert(model).await? {
            VoteInsert::Inserted(_) => Ok(()),
            VoteInsert::Conflict => {
                get_metrics().record_vote_insert_conflict();
                tracing::debug!(
                    user_id = %user_id,
                    target_id = %target_id,
                    "Vote insert lost the race, updating in place"
                );

                let rows = self
                    .vote_repo
                    .set_direction(user_id, target_kind, target_id, is_upvote)
                    .await?;
                if rows == 0 {
                    return Err(AppError::VoteContention(format!(
                        "{user_id} on {}/{target_id}: insert conflicted and the fallback update matched nothing",
                        target_kind.path_segment()
                    )));
                }
                Ok(())
            }
        }
    }

    async fn result(
        &self,
        target_kind: TargetKind,
        target_id: &str,
        my_vote: Option<Direction>,
    ) -> AppResult<ScoreResult> {
        let score = self.projector.breakdown(target_kind, target_id).await?;
        Ok(ScoreResult {
            score: score.value(),
            upvotes: score.upvotes,
            downvotes: score.downvotes,
            my_vote,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_vote(id: &str, user_id: &str, target_id: &str, is_upvote: bool) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            target_kind: TargetKind::Question,
            target_id: target_id.to_string(),
            is_upvote,
            created_at: Utc::now().into(),
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }
    }

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> VoteService {
        let repo = VoteRepository::new(db.clone());
        VoteService::new(repo, ScoreProjector::new(VoteRepository::new(db)))
    }

    // Unit tests for the cast decision
    #[test]
    fn test_plan_cast_no_row_inserts() {
        assert_eq!(plan_cast(None, true), CastPlan::Insert);
        assert_eq!(plan_cast(None, false), CastPlan::Insert);
    }

    #[test]
    fn test_plan_cast_same_direction_is_noop() {
        assert_eq!(plan_cast(Some(true), true), CastPlan::Noop);
        assert_eq!(plan_cast(Some(false), false), CastPlan::Noop);
    }

    #[test]
    fn test_plan_cast_other_direction_flips() {
        assert_eq!(plan_cast(Some(true), false), CastPlan::Flip);
        assert_eq!(plan_cast(Some(false), true), CastPlan::Flip);
    }

    #[test]
    fn test_direction_round_trip() {
        assert!(Direction::Up.is_upvote());
        assert!(!Direction::Down.is_upvote());
        assert_eq!(Direction::from_is_upvote(true), Direction::Up);
        assert_eq!(Direction::from_is_upvote(false), Direction::Down);
    }

    // Service tests
    #[tokio::test]
    async fn test_cast_vote_repeat_is_noop() {
        let existing = create_test_vote("v1", "user1", "q1", true);

        // Sequence: find existing vote, then the two tally counts.
        // No write statement is issued for an idempotent re-click.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_query_results([[count_row(1)], [count_row(0)]])
                .into_connection(),
        );

        let result = service(db)
            .cast_vote("user1", TargetKind::Question, "q1", Direction::Up)
            .await
            .unwrap();

        assert_eq!(result.score, 1);
        assert_eq!(result.my_vote, Some(Direction::Up));
    }

    #[tokio::test]
    async fn test_cast_vote_flips_existing_row() {
        let existing = create_test_vote("v1", "user1", "q1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[count_row(0)], [count_row(1)]])
                .into_connection(),
        );

        let result = service(db)
            .cast_vote("user1", TargetKind::Question, "q1", Direction::Down)
            .await
            .unwrap();

        assert_eq!(result.score, -1);
        assert_eq!(result.my_vote, Some(Direction::Down));
    }

    #[tokio::test]
    async fn test_remove_vote_clears_own_direction() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[count_row(0)], [count_row(0)]])
                .into_connection(),
        );

        let result = service(db)
            .remove_vote("user1", TargetKind::Question, "q1")
            .await
            .unwrap();

        assert_eq!(result.score, 0);
        assert!(result.my_vote.is_none());
    }

    #[tokio::test]
    async fn test_get_user_vote_maps_direction() {
        let existing = create_test_vote("v1", "user1", "a1", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let direction = service(db)
            .get_user_vote("user1", TargetKind::Answer, "a1")
            .await
            .unwrap();

        assert_eq!(direction, Some(Direction::Down));
    }

    #[tokio::test]
    async fn test_get_user_vote_none_when_absent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<vote::Model>::new()])
                .into_connection(),
        );

        let direction = service(db)
            .get_user_vote("user1", TargetKind::Answer, "a1")
            .await
            .unwrap();

        assert!(direction.is_none());
    }
}
