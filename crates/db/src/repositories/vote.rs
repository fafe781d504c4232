//! Vote repository.

use std::sync::Arc;

use crate::entities::{
    Vote,
    vote::{self, TargetKind},
};
use quorum_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    SqlErr,
};

/// Outcome of a conditional vote insert.
///
/// The unique index on (user_id, target_kind, target_id) turns a lost race
/// into an explicit branch instead of an opaque database error.
#[derive(Debug)]
pub enum VoteInsert {
    /// The row was created.
    Inserted(vote::Model),
    /// Another writer holds the (user, target) tuple; caller falls back to an
    /// update keyed by the same tuple.
    Conflict,
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's vote on a target.
    pub async fn find_by_user_and_target(
        &self,
        user_id: &str,
        target_kind: TargetKind,
        target_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::TargetKind.eq(target_kind))
            .filter(vote::Column::TargetId.eq(target_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attempt to insert a new vote row.
    ///
    /// A unique-constraint violation is reported as [`VoteInsert::Conflict`];
    /// every other database failure propagates.
    pub async fn try_insert(&self, model: vote::ActiveModel) -> AppResult<VoteInsert> {
        match model.insert(self.db.as_ref()).await {
            Ok(created) => Ok(VoteInsert::Inserted(created)),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(VoteInsert::Conflict),
                _ => Err(AppError::Database(e.to_string())),
            },
        }
    }

    /// Set the direction of an existing vote, keyed by the uniqueness tuple.
    ///
    /// A single conditional UPDATE; returns the number of rows matched so the
    /// caller can tell whether the row still existed.
    pub async fn set_direction(
        &self,
        user_id: &str,
        target_kind: TargetKind,
        target_id: &str,
        is_upvote: bool,
    ) -> AppResult<u64> {
        let result = Vote::update_many()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::TargetKind.eq(target_kind))
            .filter(vote::Column::TargetId.eq(target_id))
            .col_expr(vote::Column::IsUpvote, is_upvote.into())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete a user's vote on a target. No-op when absent.
    pub async fn delete_by_user_and_target(
        &self,
        user_id: &str,
        target_kind: TargetKind,
        target_id: &str,
    ) -> AppResult<u64> {
        let result = Vote::delete_many()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::TargetKind.eq(target_kind))
            .filter(vote::Column::TargetId.eq(target_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count up- and downvotes for a target, fresh from the vote rows.
    pub async fn tally(&self, target_kind: TargetKind, target_id: &str) -> AppResult<(u64, u64)> {
        let upvotes = self.count_direction(target_kind, target_id, true).await?;
        let downvotes = self.count_direction(target_kind, target_id, false).await?;
        Ok((upvotes, downvotes))
    }

    async fn count_direction(
        &self,
        target_kind: TargetKind,
        target_id: &str,
        is_upvote: bool,
    ) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::TargetKind.eq(target_kind))
            .filter(vote::Column::TargetId.eq(target_id))
            .filter(vote::Column::IsUpvote.eq(is_upvote))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
