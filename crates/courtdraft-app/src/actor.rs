// Per-draft actor: the serialization point for one draft's mutations and
// the owner of its turn timer.
//
// Commands arrive on a bounded mpsc queue and run one at a time in arrival
// order. The timer's expiry is handled inside the same loop, so an auto-pick
// can never interleave with a manual pick for the same turn.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use courtdraft_core::player::Player;
use courtdraft_core::rules::TurnOverlay;

use crate::draft::{Draft, DraftStatus, PickRequest, VoteCount};
use crate::engine::DraftEngine;
use crate::error::DraftError;
use crate::score::ScoreReport;

type Reply<T> = oneshot::Sender<Result<T, DraftError>>;

/// Requests a draft actor accepts.
#[derive(Debug)]
pub enum DraftCommand {
    SubmitPick {
        req: PickRequest,
        reply: Reply<Draft>,
    },
    UndoPick {
        slot: u32,
        reply: Reply<Draft>,
    },
    SaveState {
        overlay: TurnOverlay,
        status: Option<DraftStatus>,
        reply: Reply<Draft>,
    },
    Cancel {
        reply: Reply<()>,
    },
    Score {
        reply: Reply<ScoreReport>,
    },
    Snapshot {
        reply: Reply<Draft>,
    },
    Search {
        text: Option<String>,
        limit: usize,
        offset: usize,
        reply: Reply<Vec<Player>>,
    },
    RecordVote {
        voter: String,
        seat: u32,
        reply: Reply<()>,
    },
    Votes {
        reply: Reply<Vec<VoteCount>>,
    },
}

impl DraftCommand {
    /// Answer a command that will never run because the draft is gone.
    fn reject(self, draft_id: &str) {
        match self {
            DraftCommand::SubmitPick { reply, .. }
            | DraftCommand::UndoPick { reply, .. }
            | DraftCommand::SaveState { reply, .. }
            | DraftCommand::Snapshot { reply } => {
                let _ = reply.send(gone(draft_id));
            }
            DraftCommand::Cancel { reply } | DraftCommand::RecordVote { reply, .. } => {
                let _ = reply.send(gone(draft_id));
            }
            DraftCommand::Score { reply } => {
                let _ = reply.send(gone(draft_id));
            }
            DraftCommand::Search { reply, .. } => {
                let _ = reply.send(gone(draft_id));
            }
            DraftCommand::Votes { reply } => {
                let _ = reply.send(gone(draft_id));
            }
        }
    }
}

fn gone<T>(draft_id: &str) -> Result<T, DraftError> {
    Err(DraftError::draft_not_found(draft_id))
}

/// Cloneable sender side of a draft actor.
#[derive(Debug, Clone)]
pub struct DraftHandle {
    draft_id: String,
    tx: mpsc::Sender<DraftCommand>,
}

impl DraftHandle {
    pub fn draft_id(&self) -> &str {
        &self.draft_id
    }

    /// Whether the actor has stopped (after a cancel).
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> DraftCommand,
    ) -> Result<T, DraftError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| DraftError::draft_not_found(&self.draft_id))?;
        rx.await
            .map_err(|_| DraftError::draft_not_found(&self.draft_id))?
    }

    pub async fn submit_pick(&self, req: PickRequest) -> Result<Draft, DraftError> {
        self.request(|reply| DraftCommand::SubmitPick { req, reply }).await
    }

    pub async fn undo_pick(&self, slot: u32) -> Result<Draft, DraftError> {
        self.request(|reply| DraftCommand::UndoPick { slot, reply }).await
    }

    pub async fn save_state(
        &self,
        overlay: TurnOverlay,
        status: Option<DraftStatus>,
    ) -> Result<Draft, DraftError> {
        self.request(|reply| DraftCommand::SaveState {
            overlay,
            status,
            reply,
        })
        .await
    }

    pub async fn cancel(&self) -> Result<(), DraftError> {
        self.request(|reply| DraftCommand::Cancel { reply }).await
    }

    pub async fn score(&self) -> Result<ScoreReport, DraftError> {
        self.request(|reply| DraftCommand::Score { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Draft, DraftError> {
        self.request(|reply| DraftCommand::Snapshot { reply }).await
    }

    pub async fn search(
        &self,
        text: Option<String>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Player>, DraftError> {
        self.request(|reply| DraftCommand::Search {
            text,
            limit,
            offset,
            reply,
        })
        .await
    }

    pub async fn record_vote(&self, voter: String, seat: u32) -> Result<(), DraftError> {
        self.request(|reply| DraftCommand::RecordVote { voter, seat, reply })
            .await
    }

    pub async fn votes(&self) -> Result<Vec<VoteCount>, DraftError> {
        self.request(|reply| DraftCommand::Votes { reply }).await
    }
}

/// Spawn the actor for `draft_id` and return its handle.
pub fn spawn(engine: Arc<DraftEngine>, draft_id: String, queue_depth: usize) -> DraftHandle {
    let (tx, rx) = mpsc::channel(queue_depth.max(1));
    tokio::spawn(run(engine, draft_id.clone(), rx));
    DraftHandle { draft_id, tx }
}

// ---------------------------------------------------------------------------
// Turn timer
// ---------------------------------------------------------------------------

/// Identifies one turn: picks committed, seat on the clock, slot to fill.
type TurnKey = (usize, u32, u32);

/// Countdown for the current turn. Restarted only when the turn changes,
/// so saving transient state or a rejected pick leaves it running.
#[derive(Debug, Default)]
struct TurnClock {
    key: Option<TurnKey>,
    deadline: Option<Instant>,
}

impl TurnClock {
    fn update(&mut self, draft: &Draft) {
        let rules = draft.rules();
        let timer = rules.pick_timer_seconds.filter(|_| rules.auto_pick_enabled);
        let key = draft
            .current_turn()
            .map(|t| (t.pick_number, t.seat, t.slot));

        match (timer, key) {
            (Some(secs), Some(key)) => {
                if self.key != Some(key) {
                    self.key = Some(key);
                    self.deadline = Some(Instant::now() + Duration::from_secs(u64::from(secs)));
                    debug!(
                        "Draft {}: armed {secs}s timer for seat {} slot {}",
                        draft.id, key.1, key.2
                    );
                }
            }
            _ => {
                if self.deadline.take().is_some() {
                    debug!("Draft {}: turn timer cancelled", draft.id);
                }
                self.key = None;
            }
        }
    }

    /// Mark the deadline spent. The key stays so the same turn is not
    /// re-armed after a failed auto-pick.
    fn expire(&mut self) {
        self.deadline = None;
    }
}

// ---------------------------------------------------------------------------
// Actor loop
// ---------------------------------------------------------------------------

enum Flow {
    Continue,
    Stop,
}

async fn run(engine: Arc<DraftEngine>, draft_id: String, mut rx: mpsc::Receiver<DraftCommand>) {
    let mut clock = TurnClock::default();
    match engine.snapshot(&draft_id).await {
        Ok(draft) => clock.update(&draft),
        Err(e) => warn!("Draft actor for {draft_id} started without a snapshot: {e}"),
    }
    info!("Draft actor started for {draft_id}");

    loop {
        let deadline = clock.deadline;
        tokio::select! {
            cmd = rx.recv() => {
                let Some(cmd) = cmd else {
                    debug!("Draft {draft_id}: command channel closed");
                    break;
                };
                if let Flow::Stop = handle_command(&engine, &draft_id, cmd, &mut clock).await {
                    rx.close();
                    while let Some(queued) = rx.recv().await {
                        queued.reject(&draft_id);
                    }
                    break;
                }
            }

            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                clock.expire();
                info!("Draft {draft_id}: pick timer expired, auto-picking");
                match engine.auto_pick(&draft_id).await {
                    Ok(draft) => clock.update(&draft),
                    Err(e) => warn!("Draft {draft_id}: auto-pick failed, turn stalls: {e}"),
                }
            }
        }
    }

    info!("Draft actor for {draft_id} exiting");
}

async fn handle_command(
    engine: &DraftEngine,
    draft_id: &str,
    cmd: DraftCommand,
    clock: &mut TurnClock,
) -> Flow {
    match cmd {
        DraftCommand::SubmitPick { req, reply } => {
            let result = engine.submit_pick(draft_id, req, false).await;
            settle(result, reply, clock)
        }
        DraftCommand::UndoPick { slot, reply } => {
            let result = engine.undo_pick(draft_id, slot).await;
            settle(result, reply, clock)
        }
        DraftCommand::SaveState {
            overlay,
            status,
            reply,
        } => {
            let result = engine.save_transient_state(draft_id, overlay, status).await;
            settle(result, reply, clock)
        }
        DraftCommand::Snapshot { reply } => {
            let result = engine.snapshot(draft_id).await;
            settle(result, reply, clock)
        }
        DraftCommand::Cancel { reply } => {
            let result = engine.cancel_draft(draft_id).await;
            let stop = matches!(result, Ok(()) | Err(DraftError::NotFound { .. }));
            let _ = reply.send(result);
            if stop {
                Flow::Stop
            } else {
                Flow::Continue
            }
        }
        DraftCommand::Score { reply } => {
            let _ = reply.send(engine.score_draft(draft_id).await);
            Flow::Continue
        }
        DraftCommand::Search {
            text,
            limit,
            offset,
            reply,
        } => {
            let _ = reply.send(engine.search_candidates(draft_id, text, limit, offset).await);
            Flow::Continue
        }
        DraftCommand::RecordVote { voter, seat, reply } => {
            let _ = reply.send(engine.record_vote(draft_id, &voter, seat).await);
            Flow::Continue
        }
        DraftCommand::Votes { reply } => {
            let _ = reply.send(engine.vote_tally(draft_id).await);
            Flow::Continue
        }
    }
}

/// Refresh the clock from a successful result, then reply.
fn settle(result: Result<Draft, DraftError>, reply: Reply<Draft>, clock: &mut TurnClock) -> Flow {
    if let Ok(draft) = &result {
        clock.update(draft);
    }
    let _ = reply.send(result);
    Flow::Continue
}
