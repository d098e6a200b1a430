// Notification sink: full-snapshot "draft changed" events for viewers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::draft::Draft;

/// One change notification. Always carries the full state, never a diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftEvent {
    DraftChanged { draft_id: String, snapshot: Box<Draft> },
    DraftCancelled { draft_id: String, cancelled: bool },
}

impl DraftEvent {
    pub fn changed(draft: &Draft) -> Self {
        DraftEvent::DraftChanged {
            draft_id: draft.id.clone(),
            snapshot: Box::new(draft.clone()),
        }
    }

    pub fn cancelled(draft_id: &str) -> Self {
        DraftEvent::DraftCancelled {
            draft_id: draft_id.to_string(),
            cancelled: true,
        }
    }

    pub fn draft_id(&self) -> &str {
        match self {
            DraftEvent::DraftChanged { draft_id, .. } | DraftEvent::DraftCancelled { draft_id, .. } => {
                draft_id
            }
        }
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, event: DraftEvent);
}

/// Fan-out over a tokio broadcast channel.
pub struct BroadcastSink {
    tx: broadcast::Sender<DraftEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        BroadcastSink { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl NotificationSink for BroadcastSink {
    async fn publish(&self, event: DraftEvent) {
        let draft_id = event.draft_id().to_string();
        match self.tx.send(event) {
            Ok(receivers) => debug!("Published event for {draft_id} to {receivers} subscribers"),
            Err(_) => debug!("No subscribers for event on {draft_id}"),
        }
    }
}
