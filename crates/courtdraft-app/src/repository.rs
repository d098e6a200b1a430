// Persistence contract for drafts, picks, and votes.

use async_trait::async_trait;

use courtdraft_core::rules::TurnOverlay;

use crate::draft::{Draft, DraftPick, DraftStatus, NewDraft, VoteCount};
use crate::error::RepositoryError;

/// Durable store for drafts.
///
/// Implementations must make `append_pick` atomic: it either commits the
/// pick (and clears the pending-turn overlay with it) or fails with
/// [`RepositoryError::SlotTaken`] / [`RepositoryError::PlayerTaken`]
/// without changing anything.
#[async_trait]
pub trait DraftRepository: Send + Sync {
    async fn load_draft(&self, draft_id: &str) -> Result<Draft, RepositoryError>;

    async fn create_draft(&self, draft: &NewDraft) -> Result<Draft, RepositoryError>;

    /// Commit `pick`, reset the pending-turn overlay, and set `status`.
    async fn append_pick(
        &self,
        draft_id: &str,
        pick: &DraftPick,
        status: DraftStatus,
    ) -> Result<(), RepositoryError>;

    /// Remove the pick at `slot`. Returns whether a pick was removed. A
    /// `complete` draft goes back to `in_progress`.
    async fn remove_pick(&self, draft_id: &str, slot: u32) -> Result<bool, RepositoryError>;

    /// Delete the draft with its picks and votes.
    async fn delete_draft_cascade(&self, draft_id: &str) -> Result<(), RepositoryError>;

    /// Merge `overlay` into the pending-turn overlay and update the status
    /// tag when one is given.
    async fn merge_rule_overlay(
        &self,
        draft_id: &str,
        overlay: &TurnOverlay,
        status: Option<DraftStatus>,
    ) -> Result<Draft, RepositoryError>;

    /// Record (or replace) `voter`'s vote for the best roster.
    async fn record_vote(&self, draft_id: &str, voter: &str, seat: u32)
        -> Result<(), RepositoryError>;

    /// Votes per seat, ascending by seat.
    async fn vote_tally(&self, draft_id: &str) -> Result<Vec<VoteCount>, RepositoryError>;

    async fn list_draft_ids(&self) -> Result<Vec<String>, RepositoryError>;
}
