// Individual pick representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courtdraft_core::player::{PlayerId, Position};
use courtdraft_core::rules::EraWindow;

/// A committed pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    /// Roster slot, 1-based and unique within a draft.
    pub slot: u32,
    pub player_id: PlayerId,
    pub player_name: String,
    /// Position the player fills in this slot.
    pub position: Position,
    /// Season the pick was scored with; `None` for an averaged window.
    pub season_used: Option<i32>,
    /// Franchise of the season used, or the franchise constraint an
    /// averaged window was built under.
    pub franchise_used: Option<String>,
    /// Era window in force when the pick committed.
    pub era_used: Option<EraWindow>,
    /// Seat that owns the pick, fixed at commit time.
    pub owner_index: u32,
    /// Points per game of the season used, counted toward the PPG cap.
    pub ppg_used: f64,
    /// Standalone rating of the season used, counted toward the overall cap.
    pub rating_used: f64,
    /// Committed by the turn timer rather than a participant.
    #[serde(default)]
    pub auto: bool,
    /// Identity that submitted the pick, when known.
    pub picked_by: Option<String>,
    pub picked_at: DateTime<Utc>,
}

/// A pick as submitted by a participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PickRequest {
    pub slot: u32,
    pub player_id: PlayerId,
    /// Requested position for an open slot. Ignored when the slot
    /// already requires one.
    #[serde(default)]
    pub position_hint: Option<Position>,
    /// Identity of the submitting participant (checked in online rooms).
    #[serde(default)]
    pub actor: Option<String>,
    /// Franchise to take the season from, ahead of any turn lock.
    #[serde(default)]
    pub franchise: Option<String>,
    /// Era to take the season from, ahead of any turn lock.
    #[serde(default)]
    pub era: Option<EraWindow>,
}

impl PickRequest {
    pub fn new(slot: u32, player_id: PlayerId) -> Self {
        PickRequest {
            slot,
            player_id,
            ..PickRequest::default()
        }
    }

    pub fn by(mut self, actor: &str) -> Self {
        self.actor = Some(actor.to_string());
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position_hint = Some(position);
        self
    }
}
