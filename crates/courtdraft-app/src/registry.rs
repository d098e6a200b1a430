// Draft registry: maps draft ids to their running actors.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use courtdraft_core::player::Player;
use courtdraft_core::rules::TurnOverlay;

use crate::actor::{self, DraftHandle};
use crate::draft::{Draft, DraftConfig, DraftStatus, PickRequest, VoteCount};
use crate::engine::DraftEngine;
use crate::error::DraftError;
use crate::score::ScoreReport;

/// Owns one actor per active draft. The lock only guards the map and is
/// never held across an await.
pub struct DraftRegistry {
    engine: Arc<DraftEngine>,
    actors: Mutex<HashMap<String, DraftHandle>>,
    queue_depth: usize,
}

impl DraftRegistry {
    pub fn new(engine: Arc<DraftEngine>) -> Self {
        let queue_depth = engine.defaults().command_queue_depth;
        DraftRegistry {
            engine,
            actors: Mutex::new(HashMap::new()),
            queue_depth,
        }
    }

    fn actors(&self) -> MutexGuard<'_, HashMap<String, DraftHandle>> {
        // The map holds only handles, so a poisoned lock is still usable.
        self.actors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_actor(&self, draft_id: &str) -> DraftHandle {
        let mut actors = self.actors();
        if let Some(existing) = actors.get(draft_id).filter(|h| !h.is_closed()) {
            return existing.clone();
        }
        let handle = actor::spawn(Arc::clone(&self.engine), draft_id.to_string(), self.queue_depth);
        actors.insert(draft_id.to_string(), handle.clone());
        debug!("Registered actor for {draft_id}");
        handle
    }

    /// Create a draft and start its actor.
    pub async fn create(&self, config: DraftConfig) -> Result<Draft, DraftError> {
        let draft = self.engine.create_draft(config).await?;
        self.spawn_actor(&draft.id);
        Ok(draft)
    }

    /// The actor for `draft_id`, started on first use. Fails with
    /// `NotFound` for a draft the repository does not know.
    pub async fn handle(&self, draft_id: &str) -> Result<DraftHandle, DraftError> {
        let cached = self
            .actors()
            .get(draft_id)
            .filter(|h| !h.is_closed())
            .cloned();
        if let Some(handle) = cached {
            return Ok(handle);
        }
        self.engine.snapshot(draft_id).await?;
        Ok(self.spawn_actor(draft_id))
    }

    /// Start actors for every stored draft, so pick timers resume after a
    /// restart. Returns how many were started.
    pub async fn restore(&self) -> Result<usize, DraftError> {
        let ids = self.engine.repository().list_draft_ids().await?;
        for id in &ids {
            self.spawn_actor(id);
        }
        info!("Restored {} draft actors", ids.len());
        Ok(ids.len())
    }

    pub fn active_drafts(&self) -> usize {
        self.actors().values().filter(|h| !h.is_closed()).count()
    }

    pub async fn submit_pick(&self, draft_id: &str, req: PickRequest) -> Result<Draft, DraftError> {
        self.handle(draft_id).await?.submit_pick(req).await
    }

    pub async fn undo_pick(&self, draft_id: &str, slot: u32) -> Result<Draft, DraftError> {
        self.handle(draft_id).await?.undo_pick(slot).await
    }

    pub async fn save_state(
        &self,
        draft_id: &str,
        overlay: TurnOverlay,
        status: Option<DraftStatus>,
    ) -> Result<Draft, DraftError> {
        self.handle(draft_id).await?.save_state(overlay, status).await
    }

    pub async fn score(&self, draft_id: &str) -> Result<ScoreReport, DraftError> {
        self.handle(draft_id).await?.score().await
    }

    pub async fn snapshot(&self, draft_id: &str) -> Result<Draft, DraftError> {
        self.handle(draft_id).await?.snapshot().await
    }

    pub async fn search(
        &self,
        draft_id: &str,
        text: Option<String>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Player>, DraftError> {
        self.handle(draft_id).await?.search(text, limit, offset).await
    }

    pub async fn record_vote(&self, draft_id: &str, voter: &str, seat: u32) -> Result<(), DraftError> {
        self.handle(draft_id)
            .await?
            .record_vote(voter.to_string(), seat)
            .await
    }

    pub async fn votes(&self, draft_id: &str) -> Result<Vec<VoteCount>, DraftError> {
        self.handle(draft_id).await?.votes().await
    }

    /// Cancel the draft through its actor and drop the actor.
    pub async fn cancel(&self, draft_id: &str) -> Result<(), DraftError> {
        let handle = self.handle(draft_id).await?;
        let result = handle.cancel().await;
        if self.actors().remove(draft_id).is_none() {
            warn!("Actor for {draft_id} was already unregistered");
        }
        result
    }
}
