// Error taxonomy of the draft engine and its collaborators.

use thiserror::Error;

use courtdraft_core::player::PlayerId;
use courtdraft_core::season::SelectionError;
use courtdraft_core::validation::RuleViolation;

/// Failures reported by a [`DraftRepository`](crate::repository::DraftRepository).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("draft {draft_id} does not exist")]
    DraftNotFound { draft_id: String },

    #[error("slot {slot} of draft {draft_id} is already filled")]
    SlotTaken { draft_id: String, slot: u32 },

    #[error("player {player_id} is already drafted in {draft_id}")]
    PlayerTaken { draft_id: String, player_id: PlayerId },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Failures loading or querying the season catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("catalog validation error: {0}")]
    Validation(String),
}

/// Everything a draft operation can be rejected with.
///
/// All of these are returned to the caller as-is; the engine never retries.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("turn violation: {reason}")]
    TurnViolation { reason: String },

    #[error("eligibility violation: {reason}")]
    EligibilityViolation { reason: String },

    #[error("player {player_id} is already drafted")]
    DuplicatePlayer { player_id: PlayerId },

    #[error("no valid season: {reason}")]
    NoValidSeason { reason: String },

    #[error("cap exceeded: {message}")]
    CapExceeded { message: String },

    #[error("undo is not allowed in an online draft")]
    UndoNotAllowed,

    #[error("slot {slot} was filled concurrently; refresh and retry")]
    ConcurrentModification { slot: u32 },

    #[error("invalid draft configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("storage failure: {message}")]
    Storage { message: String },
}

impl DraftError {
    pub fn draft_not_found(draft_id: &str) -> Self {
        DraftError::NotFound {
            what: format!("draft {draft_id}"),
        }
    }

    pub fn turn(reason: impl Into<String>) -> Self {
        DraftError::TurnViolation {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            DraftError::NotFound { .. } => "not_found",
            DraftError::TurnViolation { .. } => "turn_violation",
            DraftError::EligibilityViolation { .. } => "eligibility_violation",
            DraftError::DuplicatePlayer { .. } => "duplicate_player",
            DraftError::NoValidSeason { .. } => "no_valid_season",
            DraftError::CapExceeded { .. } => "cap_exceeded",
            DraftError::UndoNotAllowed => "undo_not_allowed",
            DraftError::ConcurrentModification { .. } => "concurrent_modification",
            DraftError::InvalidConfig { .. } => "invalid_config",
            DraftError::Storage { .. } => "storage",
        }
    }
}

impl From<RepositoryError> for DraftError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DraftNotFound { draft_id } => DraftError::draft_not_found(&draft_id),
            RepositoryError::SlotTaken { slot, .. } => DraftError::ConcurrentModification { slot },
            RepositoryError::PlayerTaken { player_id, .. } => {
                DraftError::DuplicatePlayer { player_id }
            }
            RepositoryError::Storage(e) => DraftError::Storage {
                message: format!("{e:#}"),
            },
        }
    }
}

impl From<CatalogError> for DraftError {
    fn from(err: CatalogError) -> Self {
        DraftError::Storage {
            message: err.to_string(),
        }
    }
}

impl From<SelectionError> for DraftError {
    fn from(err: SelectionError) -> Self {
        DraftError::NoValidSeason {
            reason: err.to_string(),
        }
    }
}

impl From<RuleViolation> for DraftError {
    fn from(violation: RuleViolation) -> Self {
        if violation.is_cap() {
            DraftError::CapExceeded {
                message: violation.to_string(),
            }
        } else {
            DraftError::EligibilityViolation {
                reason: violation.to_string(),
            }
        }
    }
}
