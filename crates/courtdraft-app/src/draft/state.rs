// Draft state: frozen settings, committed picks, and whose turn it is.
//
// Turn order is never stored. It is derived from the number of committed
// picks every time it is needed, through `Draft::current_turn`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courtdraft_core::player::{PlayerId, Position};
use courtdraft_core::rules::{DraftMode, EraWindow, RuleOverrides, RuleSet, TurnOverlay};

use super::pick::DraftPick;
use crate::error::DraftError;

/// Upper bounds on draft size accepted at creation.
pub const MAX_PARTICIPANTS: u32 = 64;
pub const MAX_PLAYERS_PER_TEAM: u32 = 32;

/// Progress tag shown to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    #[default]
    InProgress,
    Saved,
    Complete,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::InProgress => "in_progress",
            DraftStatus::Saved => "saved",
            DraftStatus::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(DraftStatus::InProgress),
            "saved" => Some(DraftStatus::Saved),
            "complete" => Some(DraftStatus::Complete),
            _ => None,
        }
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-roster votes cast for one seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    pub seat: u32,
    pub votes: u32,
}

/// Seat number of the `n`th pick (0-based count), 1-based round robin.
pub fn active_seat(pick_count: usize, participants: u32) -> u32 {
    (pick_count as u32 % participants.max(1)) + 1
}

/// Seat that owns `slot`: each seat owns a contiguous block of
/// `players_per_team` slots.
pub fn slot_owner(slot: u32, players_per_team: u32) -> u32 {
    (slot.saturating_sub(1)) / players_per_team.max(1) + 1
}

/// The default slot layout: one slot per position in display order, then
/// open slots. Drafts that do not enforce positions get all open slots.
pub fn default_layout(players_per_team: u32, position_enforced: bool) -> Vec<Option<Position>> {
    (0..players_per_team as usize)
        .map(|i| {
            if position_enforced {
                Position::ALL.get(i).copied()
            } else {
                None
            }
        })
        .collect()
}

/// A request to create a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftConfig {
    pub title: String,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub mode: DraftMode,
    /// Changes to the mode's default rules.
    #[serde(default)]
    pub rules: RuleOverrides,
    pub participants: u32,
    pub players_per_team: u32,
    #[serde(default)]
    pub era: Option<EraWindow>,
    /// Draw the era window at random instead of using `era`.
    #[serde(default)]
    pub random_era: bool,
    #[serde(default)]
    pub franchise: Option<String>,
    /// Identity assigned to each seat, in seat order. Non-empty makes the
    /// draft an online room.
    #[serde(default)]
    pub seats: Vec<String>,
    /// Required position per slot within a seat's block.
    #[serde(default)]
    pub slot_positions: Option<Vec<Option<Position>>>,
}

impl DraftConfig {
    pub fn new(title: &str, mode: DraftMode, participants: u32, players_per_team: u32) -> Self {
        DraftConfig {
            title: title.to_string(),
            league: String::new(),
            mode,
            rules: RuleOverrides::default(),
            participants,
            players_per_team,
            era: None,
            random_era: false,
            franchise: None,
            seats: Vec::new(),
            slot_positions: None,
        }
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        let invalid = |reason: String| Err(DraftError::InvalidConfig { reason });
        if self.participants == 0 {
            return invalid("participants must be greater than 0".into());
        }
        if self.players_per_team == 0 {
            return invalid("players_per_team must be greater than 0".into());
        }
        if self.participants > MAX_PARTICIPANTS {
            return invalid(format!(
                "participants must be at most {MAX_PARTICIPANTS}, got {}",
                self.participants
            ));
        }
        if self.players_per_team > MAX_PLAYERS_PER_TEAM {
            return invalid(format!(
                "players_per_team must be at most {MAX_PLAYERS_PER_TEAM}, got {}",
                self.players_per_team
            ));
        }
        if !self.seats.is_empty() && self.seats.len() != self.participants as usize {
            return invalid(format!(
                "{} seat identities for {} participants",
                self.seats.len(),
                self.participants
            ));
        }
        if let Some(layout) = &self.slot_positions {
            if layout.len() != self.players_per_team as usize {
                return invalid(format!(
                    "slot layout has {} entries, expected {}",
                    layout.len(),
                    self.players_per_team
                ));
            }
        }
        if let Some(era) = self.era {
            if era.from > era.to {
                return invalid(format!("era {}-{} is reversed", era.from, era.to));
            }
        }
        Ok(())
    }
}

/// Configuration frozen when the draft was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSettings {
    pub mode: DraftMode,
    pub rules: RuleSet,
    pub participants: u32,
    pub players_per_team: u32,
    pub era: Option<EraWindow>,
    #[serde(default)]
    pub random_era: bool,
    pub franchise: Option<String>,
    #[serde(default)]
    pub seats: Vec<String>,
    pub slot_positions: Vec<Option<Position>>,
}

/// A draft about to be inserted; the repository assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDraft {
    pub title: String,
    pub league: String,
    pub settings: DraftSettings,
}

/// Whose turn it is and which slot they must fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub seat: u32,
    pub slot: u32,
    /// Picks committed when this turn began.
    pub pick_number: usize,
}

/// The complete state of one draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub title: String,
    pub league: String,
    pub settings: DraftSettings,
    /// Franchise/era locked for the current turn only.
    pub pending: TurnOverlay,
    pub status: DraftStatus,
    pub created_at: DateTime<Utc>,
    /// Committed picks ordered by slot.
    pub picks: Vec<DraftPick>,
}

impl Draft {
    pub fn rules(&self) -> &RuleSet {
        &self.settings.rules
    }

    pub fn max_players(&self) -> u32 {
        self.settings
            .participants
            .saturating_mul(self.settings.players_per_team)
    }

    pub fn is_complete(&self) -> bool {
        self.picks.len() >= self.max_players() as usize
    }

    /// Online rooms bind each seat to an identity.
    pub fn is_online(&self) -> bool {
        !self.settings.seats.is_empty()
    }

    pub fn owner_of(&self, slot: u32) -> u32 {
        slot_owner(slot, self.settings.players_per_team)
    }

    pub fn is_valid_slot(&self, slot: u32) -> bool {
        (1..=self.max_players()).contains(&slot)
    }

    pub fn is_filled(&self, slot: u32) -> bool {
        self.picks.iter().any(|p| p.slot == slot)
    }

    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.picks.iter().any(|p| p.player_id == player_id)
    }

    pub fn pick_at(&self, slot: u32) -> Option<&DraftPick> {
        self.picks.iter().find(|p| p.slot == slot)
    }

    /// Identity bound to `seat`, in online rooms.
    pub fn seat_identity(&self, seat: u32) -> Option<&str> {
        let idx = seat.checked_sub(1)? as usize;
        self.settings.seats.get(idx).map(String::as_str)
    }

    /// Position a slot requires, when positions are enforced.
    pub fn slot_position(&self, slot: u32) -> Option<Position> {
        if !self.rules().position_enforced || slot == 0 {
            return None;
        }
        let ppt = self.settings.players_per_team.max(1);
        let idx = ((slot - 1) % ppt) as usize;
        self.settings.slot_positions.get(idx).copied().flatten()
    }

    /// Slots owned by `seat`, ascending.
    pub fn seat_slots(&self, seat: u32) -> std::ops::RangeInclusive<u32> {
        let ppt = self.settings.players_per_team;
        let first = (seat.saturating_sub(1)) * ppt + 1;
        first..=first + ppt - 1
    }

    /// Picks owned by `seat`, ordered by slot.
    pub fn seat_picks(&self, seat: u32) -> Vec<&DraftPick> {
        self.picks.iter().filter(|p| p.owner_index == seat).collect()
    }

    fn first_open_slot(&self, seat: u32) -> Option<u32> {
        self.seat_slots(seat).find(|&slot| !self.is_filled(slot))
    }

    /// The turn in progress, or `None` once every slot is filled.
    ///
    /// The active seat comes from the pick count. If an out-of-order undo
    /// left that seat with nothing to fill, the turn passes to the next
    /// seat in round-robin order that still has an open slot.
    pub fn current_turn(&self) -> Option<Turn> {
        if self.is_complete() {
            return None;
        }
        let participants = self.settings.participants;
        let start = active_seat(self.picks.len(), participants);
        (0..participants)
            .map(|offset| (start - 1 + offset) % participants + 1)
            .find_map(|seat| {
                self.first_open_slot(seat).map(|slot| Turn {
                    seat,
                    slot,
                    pick_number: self.picks.len(),
                })
            })
    }
}
