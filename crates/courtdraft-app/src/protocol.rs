// JSON wire protocol between WebSocket clients and the draft registry.
//
// Clients send one `ClientMessage` per text frame and get exactly one
// `ReplyMessage` back carrying the same `id`. Change notifications are sent
// separately as serialized `DraftEvent`s.

use serde::{Deserialize, Serialize};

use courtdraft_core::player::Player;
use courtdraft_core::rules::TurnOverlay;

use crate::draft::{Draft, DraftConfig, DraftStatus, PickRequest, VoteCount};
use crate::error::DraftError;
use crate::registry::DraftRegistry;
use crate::score::ScoreReport;

/// Commands a client can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    CreateDraft {
        config: DraftConfig,
    },
    SubmitPick {
        draft_id: String,
        #[serde(flatten)]
        pick: PickRequest,
    },
    UndoPick {
        draft_id: String,
        slot: u32,
    },
    SaveState {
        draft_id: String,
        #[serde(default)]
        overlay: TurnOverlay,
        #[serde(default)]
        status: Option<DraftStatus>,
    },
    CancelDraft {
        draft_id: String,
    },
    ScoreDraft {
        draft_id: String,
    },
    GetDraft {
        draft_id: String,
    },
    SearchCandidates {
        draft_id: String,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        limit: usize,
        #[serde(default)]
        offset: usize,
    },
    CastVote {
        draft_id: String,
        voter: String,
        seat: u32,
    },
    GetVotes {
        draft_id: String,
    },
}

/// A command with the client's correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub command: ClientCommand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerReply {
    Draft { draft: Box<Draft> },
    Cancelled { draft_id: String },
    Score { report: ScoreReport },
    Candidates { players: Vec<Player> },
    VoteRecorded { draft_id: String },
    Votes { draft_id: String, tally: Vec<VoteCount> },
    Error { code: String, message: String },
}

impl ServerReply {
    pub fn error(err: &DraftError) -> Self {
        ServerReply::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    fn draft(draft: Draft) -> Self {
        ServerReply::Draft {
            draft: Box::new(draft),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub reply: ServerReply,
}

/// Run one command against the registry.
pub async fn handle_command(registry: &DraftRegistry, command: ClientCommand) -> ServerReply {
    let result = match command {
        ClientCommand::CreateDraft { config } => registry.create(config).await.map(ServerReply::draft),
        ClientCommand::SubmitPick { draft_id, pick } => registry
            .submit_pick(&draft_id, pick)
            .await
            .map(ServerReply::draft),
        ClientCommand::UndoPick { draft_id, slot } => registry
            .undo_pick(&draft_id, slot)
            .await
            .map(ServerReply::draft),
        ClientCommand::SaveState {
            draft_id,
            overlay,
            status,
        } => registry
            .save_state(&draft_id, overlay, status)
            .await
            .map(ServerReply::draft),
        ClientCommand::CancelDraft { draft_id } => registry
            .cancel(&draft_id)
            .await
            .map(|()| ServerReply::Cancelled { draft_id }),
        ClientCommand::ScoreDraft { draft_id } => registry
            .score(&draft_id)
            .await
            .map(|report| ServerReply::Score { report }),
        ClientCommand::GetDraft { draft_id } => {
            registry.snapshot(&draft_id).await.map(ServerReply::draft)
        }
        ClientCommand::SearchCandidates {
            draft_id,
            text,
            limit,
            offset,
        } => registry
            .search(&draft_id, text, limit, offset)
            .await
            .map(|players| ServerReply::Candidates { players }),
        ClientCommand::CastVote {
            draft_id,
            voter,
            seat,
        } => registry
            .record_vote(&draft_id, &voter, seat)
            .await
            .map(|()| ServerReply::VoteRecorded { draft_id }),
        ClientCommand::GetVotes { draft_id } => registry
            .votes(&draft_id)
            .await
            .map(|tally| ServerReply::Votes { draft_id, tally }),
    };
    result.unwrap_or_else(|e| ServerReply::error(&e))
}

/// Parse a raw text frame and run it. Malformed JSON gets an error reply
/// without an id.
pub async fn handle_text(registry: &DraftRegistry, text: &str) -> ReplyMessage {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => ReplyMessage {
            id: message.id,
            reply: handle_command(registry, message.command).await,
        },
        Err(e) => ReplyMessage {
            id: None,
            reply: ServerReply::Error {
                code: "bad_request".into(),
                message: format!("invalid command: {e}"),
            },
        },
    }
}
