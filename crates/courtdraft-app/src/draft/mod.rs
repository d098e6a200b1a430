// Draft model: configuration, committed picks, and turn derivation.

pub mod pick;
pub mod state;

pub use pick::{DraftPick, PickRequest};
pub use state::{Draft, DraftConfig, DraftSettings, DraftStatus, NewDraft, Turn, VoteCount};
