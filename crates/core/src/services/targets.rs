//! Target directory.
//!
//! The vote and notification producers' window onto the collaborator-owned
//! question/answer stores: existence checks and author lookup, nothing more.

use quorum_common::AppResult;
use quorum_db::{
    entities::vote::TargetKind,
    repositories::{AnswerRepository, QuestionRepository},
};

/// Lookup surface over vote/notification targets.
#[derive(Clone)]
pub struct TargetDirectory {
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
}

impl TargetDirectory {
    /// Create a new target directory.
    #[must_use]
    pub const fn new(question_repo: QuestionRepository, answer_repo: AnswerRepository) -> Self {
        Self {
            question_repo,
            answer_repo,
        }
    }

    /// The author of a target, or None when the target does not exist.
    pub async fn author_of(
        &self,
        target_kind: TargetKind,
        target_id: &str,
    ) -> AppResult<Option<String>> {
        match target_kind {
            TargetKind::Question => Ok(self
                .question_repo
                .find_by_id(target_id)
                .await?
                .map(|q| q.author_id)),
            TargetKind::Answer => Ok(self
                .answer_repo
                .find_by_id(target_id)
                .await?
                .map(|a| a.author_id)),
        }
    }

    /// Whether the target exists.
    pub async fn exists(&self, target_kind: TargetKind, target_id: &str) -> AppResult<bool> {
        Ok(self.author_of(target_kind, target_id).await?.is_some())
    }
}
