//! Score projector.
//!
//! Read-side projection of a target's score from the vote rows. Always
//! recomputed at call time; there is deliberately no stored counter to drift
//! out of sync with the ledger.

use quorum_common::AppResult;
use quorum_db::{entities::vote::TargetKind, repositories::VoteRepository};
use serde::Serialize;

/// Fresh vote counts for one target.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetScore {
    pub upvotes: u64,
    pub downvotes: u64,
}

impl TargetScore {
    /// `upvotes - downvotes`.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.upvotes as i64 - self.downvotes as i64
    }
}

/// Stateless score projection over the vote set.
#[derive(Clone)]
pub struct ScoreProjector {
    vote_repo: VoteRepository,
}

impl ScoreProjector {
    /// Create a new score projector.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository) -> Self {
        Self { vote_repo }
    }

    /// Up/down counts for a target, fresh from the vote rows.
    pub async fn breakdown(&self, target_kind: TargetKind, target_id: &str) -> AppResult<TargetScore> {
        let (upvotes, downvotes) = self.vote_repo.tally(target_kind, target_id).await?;
        Ok(TargetScore { upvotes, downvotes })
    }

    /// The target's current score.
    pub async fn score(&self, target_kind: TargetKind, target_id: &str) -> AppResult<i64> {
        Ok(self.breakdown(target_kind, target_id).await?.value())
    }
}
