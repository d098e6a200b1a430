// SQLite persistence layer for drafts, picks, and votes.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction};

use courtdraft_core::player::Position;
use courtdraft_core::rules::{EraWindow, TurnOverlay};

use crate::draft::{Draft, DraftPick, DraftSettings, DraftStatus, NewDraft, VoteCount};
use crate::error::RepositoryError;
use crate::repository::DraftRepository;

/// SQLite-backed draft store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS drafts (
                id           TEXT PRIMARY KEY,
                title        TEXT NOT NULL,
                league       TEXT NOT NULL,
                mode         TEXT NOT NULL,
                settings     TEXT NOT NULL,
                pending_turn TEXT NOT NULL DEFAULT '{}',
                status       TEXT NOT NULL,
                created_at   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS draft_picks (
                draft_id       TEXT NOT NULL REFERENCES drafts(id),
                slot           INTEGER NOT NULL,
                player_id      INTEGER NOT NULL,
                player_name    TEXT NOT NULL,
                position       TEXT NOT NULL,
                season_used    INTEGER,
                franchise_used TEXT,
                era_used       TEXT,
                owner_index    INTEGER NOT NULL,
                ppg_used       REAL NOT NULL,
                rating_used    REAL NOT NULL,
                auto_pick      INTEGER NOT NULL DEFAULT 0,
                picked_by      TEXT,
                picked_at      TEXT NOT NULL,
                PRIMARY KEY (draft_id, slot),
                UNIQUE (draft_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS draft_votes (
                draft_id   TEXT NOT NULL REFERENCES drafts(id),
                voter      TEXT NOT NULL,
                seat       INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (draft_id, voter)
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Generate a new unique draft ID based on the current UTC timestamp.
    ///
    /// Format: `draft_YYYYMMDD_HHMMSS_SSS_xxxx`. The random suffix keeps two
    /// drafts created in the same millisecond apart.
    pub fn generate_draft_id() -> String {
        let now = Utc::now();
        let suffix: u16 = rand::random();
        format!("{}_{suffix:04x}", now.format("draft_%Y%m%d_%H%M%S_%3f"))
    }

    fn draft_exists(conn: &Connection, draft_id: &str) -> Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM drafts WHERE id = ?1)",
            params![draft_id],
            |row| row.get(0),
        )
        .context("failed to check draft existence")
    }

    fn require_draft(conn: &Connection, draft_id: &str) -> Result<(), RepositoryError> {
        if Self::draft_exists(conn, draft_id)? {
            Ok(())
        } else {
            Err(RepositoryError::DraftNotFound {
                draft_id: draft_id.to_string(),
            })
        }
    }

    pub fn insert_draft(&self, new: &NewDraft) -> Result<Draft, RepositoryError> {
        let id = Self::generate_draft_id();
        let created_at = Utc::now();
        let settings =
            serde_json::to_string(&new.settings).context("failed to serialize draft settings")?;
        {
            let conn = self.conn();
            conn.execute(
                "INSERT INTO drafts (id, title, league, mode, settings, pending_turn, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, '{}', ?6, ?7)",
                params![
                    id,
                    new.title,
                    new.league,
                    new.settings.mode.as_str(),
                    settings,
                    DraftStatus::InProgress.as_str(),
                    created_at.to_rfc3339(),
                ],
            )
            .context("failed to insert draft")?;
        }
        self.fetch_draft(&id)
    }

    /// Load a draft with its picks ordered by slot.
    pub fn fetch_draft(&self, draft_id: &str) -> Result<Draft, RepositoryError> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT title, league, settings, pending_turn, status, created_at
                 FROM drafts WHERE id = ?1",
                params![draft_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()
            .context("failed to query draft")?;

        let Some((title, league, settings, pending, status, created_at)) = row else {
            return Err(RepositoryError::DraftNotFound {
                draft_id: draft_id.to_string(),
            });
        };

        let settings: DraftSettings =
            serde_json::from_str(&settings).context("failed to deserialize draft settings")?;
        let pending: TurnOverlay =
            serde_json::from_str(&pending).context("failed to deserialize pending turn")?;
        let status = DraftStatus::parse(&status)
            .with_context(|| format!("unknown draft status '{status}'"))?;
        let created_at = parse_timestamp(&created_at)?;
        let picks = Self::load_picks(&conn, draft_id)?;

        Ok(Draft {
            id: draft_id.to_string(),
            title,
            league,
            settings,
            pending,
            status,
            created_at,
            picks,
        })
    }

    fn load_picks(conn: &Connection, draft_id: &str) -> Result<Vec<DraftPick>> {
        let mut stmt = conn
            .prepare(
                "SELECT slot, player_id, player_name, position, season_used, franchise_used,
                        era_used, owner_index, ppg_used, rating_used, auto_pick, picked_by, picked_at
                 FROM draft_picks WHERE draft_id = ?1 ORDER BY slot",
            )
            .context("failed to prepare load_picks query")?;

        let rows = stmt
            .query_map(params![draft_id], |row| {
                Ok(PickRow {
                    slot: row.get(0)?,
                    player_id: row.get(1)?,
                    player_name: row.get(2)?,
                    position: row.get(3)?,
                    season_used: row.get(4)?,
                    franchise_used: row.get(5)?,
                    era_used: row.get(6)?,
                    owner_index: row.get(7)?,
                    ppg_used: row.get(8)?,
                    rating_used: row.get(9)?,
                    auto: row.get(10)?,
                    picked_by: row.get(11)?,
                    picked_at: row.get(12)?,
                })
            })
            .context("failed to query draft picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft pick rows")?;

        rows.into_iter().map(PickRow::into_pick).collect()
    }

    /// Insert a pick, clear the pending turn, and set the status in one
    /// transaction. The table constraints are the uniqueness check.
    pub fn insert_pick(
        &self,
        draft_id: &str,
        pick: &DraftPick,
        status: DraftStatus,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        Self::require_draft(&tx, draft_id)?;

        let era_json = pick
            .era_used
            .map(|era| serde_json::to_string(&era))
            .transpose()
            .context("failed to serialize era_used")?;

        let inserted = tx.execute(
            "INSERT INTO draft_picks
                (draft_id, slot, player_id, player_name, position, season_used, franchise_used,
                 era_used, owner_index, ppg_used, rating_used, auto_pick, picked_by, picked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                draft_id,
                pick.slot,
                pick.player_id,
                pick.player_name,
                pick.position.display_str(),
                pick.season_used,
                pick.franchise_used,
                era_json,
                pick.owner_index,
                pick.ppg_used,
                pick.rating_used,
                pick.auto,
                pick.picked_by,
                pick.picked_at.to_rfc3339(),
            ],
        );
        if let Err(e) = inserted {
            return Err(classify_insert_error(e, draft_id, pick));
        }

        Self::write_turn_state(&tx, draft_id, &TurnOverlay::default(), status)?;
        tx.commit().context("failed to commit pick")?;
        Ok(())
    }

    fn write_turn_state(
        tx: &Transaction<'_>,
        draft_id: &str,
        pending: &TurnOverlay,
        status: DraftStatus,
    ) -> Result<()> {
        let pending = serde_json::to_string(pending).context("failed to serialize pending turn")?;
        tx.execute(
            "UPDATE drafts SET pending_turn = ?2, status = ?3 WHERE id = ?1",
            params![draft_id, pending, status.as_str()],
        )
        .context("failed to update turn state")?;
        Ok(())
    }

    pub fn delete_pick(&self, draft_id: &str, slot: u32) -> Result<bool, RepositoryError> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        Self::require_draft(&tx, draft_id)?;
        let removed = tx
            .execute(
                "DELETE FROM draft_picks WHERE draft_id = ?1 AND slot = ?2",
                params![draft_id, slot],
            )
            .context("failed to delete draft pick")?;
        if removed > 0 {
            tx.execute(
                "UPDATE drafts SET status = ?2 WHERE id = ?1 AND status = ?3",
                params![
                    draft_id,
                    DraftStatus::InProgress.as_str(),
                    DraftStatus::Complete.as_str()
                ],
            )
            .context("failed to reopen draft")?;
        }
        tx.commit().context("failed to commit undo")?;
        Ok(removed > 0)
    }

    /// Delete votes, picks, and the draft row. Uses a transaction with
    /// automatic rollback on error.
    pub fn delete_draft(&self, draft_id: &str) -> Result<(), RepositoryError> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        Self::require_draft(&tx, draft_id)?;
        tx.execute("DELETE FROM draft_votes WHERE draft_id = ?1", params![draft_id])
            .context("failed to delete draft votes")?;
        tx.execute("DELETE FROM draft_picks WHERE draft_id = ?1", params![draft_id])
            .context("failed to delete draft picks")?;
        tx.execute("DELETE FROM drafts WHERE id = ?1", params![draft_id])
            .context("failed to delete draft")?;
        tx.commit().context("failed to commit cancel")?;
        Ok(())
    }

    pub fn merge_pending_turn(
        &self,
        draft_id: &str,
        overlay: &TurnOverlay,
        status: Option<DraftStatus>,
    ) -> Result<Draft, RepositoryError> {
        {
            let mut conn = self.conn();
            let tx = conn.transaction().context("failed to begin transaction")?;
            let current = tx
                .query_row(
                    "SELECT pending_turn, status FROM drafts WHERE id = ?1",
                    params![draft_id],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()
                .context("failed to query pending turn")?;
            let Some((pending, current_status)) = current else {
                return Err(RepositoryError::DraftNotFound {
                    draft_id: draft_id.to_string(),
                });
            };
            let mut pending: TurnOverlay =
                serde_json::from_str(&pending).context("failed to deserialize pending turn")?;
            pending.merge(overlay.clone());
            let status = match status {
                Some(s) => s,
                None => DraftStatus::parse(&current_status)
                    .with_context(|| format!("unknown draft status '{current_status}'"))?,
            };
            Self::write_turn_state(&tx, draft_id, &pending, status)?;
            tx.commit().context("failed to commit pending turn")?;
        }
        self.fetch_draft(draft_id)
    }

    pub fn upsert_vote(&self, draft_id: &str, voter: &str, seat: u32) -> Result<(), RepositoryError> {
        let conn = self.conn();
        Self::require_draft(&conn, draft_id)?;
        conn.execute(
            "INSERT INTO draft_votes (draft_id, voter, seat) VALUES (?1, ?2, ?3)
             ON CONFLICT(draft_id, voter) DO UPDATE SET seat = excluded.seat",
            params![draft_id, voter, seat],
        )
        .context("failed to record vote")?;
        Ok(())
    }

    /// Votes per seat, ascending by seat. Seats nobody voted for are
    /// left out.
    pub fn votes_by_seat(&self, draft_id: &str) -> Result<Vec<VoteCount>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT seat, COUNT(*) FROM draft_votes WHERE draft_id = ?1
                 GROUP BY seat ORDER BY seat",
            )
            .context("failed to prepare vote tally")?;
        let tally = stmt
            .query_map(params![draft_id], |row| {
                Ok(VoteCount {
                    seat: row.get(0)?,
                    votes: row.get(1)?,
                })
            })
            .context("failed to query vote tally")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map vote rows")?;
        Ok(tally)
    }

    pub fn draft_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id FROM drafts ORDER BY created_at, id")
            .context("failed to prepare draft id query")?;
        let ids = stmt
            .query_map([], |row| row.get(0))
            .context("failed to query draft ids")?
            .collect::<std::result::Result<Vec<String>, _>>()
            .context("failed to map draft id rows")?;
        Ok(ids)
    }
}

/// Raw `draft_picks` row before string columns are parsed.
struct PickRow {
    slot: u32,
    player_id: i64,
    player_name: String,
    position: String,
    season_used: Option<i32>,
    franchise_used: Option<String>,
    era_used: Option<String>,
    owner_index: u32,
    ppg_used: f64,
    rating_used: f64,
    auto: bool,
    picked_by: Option<String>,
    picked_at: String,
}

impl PickRow {
    fn into_pick(self) -> Result<DraftPick> {
        let position = Position::from_str_pos(&self.position)
            .with_context(|| format!("unknown position '{}' in slot {}", self.position, self.slot))?;
        let era_used = self
            .era_used
            .map(|json| serde_json::from_str::<EraWindow>(&json))
            .transpose()
            .context("failed to deserialize era_used")?;
        Ok(DraftPick {
            slot: self.slot,
            player_id: self.player_id,
            player_name: self.player_name,
            position,
            season_used: self.season_used,
            franchise_used: self.franchise_used,
            era_used,
            owner_index: self.owner_index,
            ppg_used: self.ppg_used,
            rating_used: self.rating_used,
            auto: self.auto,
            picked_by: self.picked_by,
            picked_at: parse_timestamp(&self.picked_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid timestamp '{raw}'"))?
        .with_timezone(&Utc))
}

/// Map a failed pick insert onto the constraint it tripped.
fn classify_insert_error(err: rusqlite::Error, draft_id: &str, pick: &DraftPick) -> RepositoryError {
    if let rusqlite::Error::SqliteFailure(code, message) = &err {
        if code.code == ErrorCode::ConstraintViolation {
            let message = message.as_deref().unwrap_or_default();
            if message.contains("player_id") {
                return RepositoryError::PlayerTaken {
                    draft_id: draft_id.to_string(),
                    player_id: pick.player_id,
                };
            }
            return RepositoryError::SlotTaken {
                draft_id: draft_id.to_string(),
                slot: pick.slot,
            };
        }
    }
    RepositoryError::Storage(anyhow::Error::new(err).context("failed to insert draft pick"))
}

#[async_trait]
impl DraftRepository for Database {
    async fn load_draft(&self, draft_id: &str) -> Result<Draft, RepositoryError> {
        self.fetch_draft(draft_id)
    }

    async fn create_draft(&self, draft: &NewDraft) -> Result<Draft, RepositoryError> {
        self.insert_draft(draft)
    }

    async fn append_pick(
        &self,
        draft_id: &str,
        pick: &DraftPick,
        status: DraftStatus,
    ) -> Result<(), RepositoryError> {
        self.insert_pick(draft_id, pick, status)
    }

    async fn remove_pick(&self, draft_id: &str, slot: u32) -> Result<bool, RepositoryError> {
        self.delete_pick(draft_id, slot)
    }

    async fn delete_draft_cascade(&self, draft_id: &str) -> Result<(), RepositoryError> {
        self.delete_draft(draft_id)
    }

    async fn merge_rule_overlay(
        &self,
        draft_id: &str,
        overlay: &TurnOverlay,
        status: Option<DraftStatus>,
    ) -> Result<Draft, RepositoryError> {
        self.merge_pending_turn(draft_id, overlay, status)
    }

    async fn record_vote(
        &self,
        draft_id: &str,
        voter: &str,
        seat: u32,
    ) -> Result<(), RepositoryError> {
        self.upsert_vote(draft_id, voter, seat)
    }

    async fn vote_tally(&self, draft_id: &str) -> Result<Vec<VoteCount>, RepositoryError> {
        Ok(self.votes_by_seat(draft_id)?)
    }

    async fn list_draft_ids(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.draft_ids()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::state::default_layout;
    use courtdraft_core::rules::{DraftMode, RuleSet};

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory db should open")
    }

    fn new_draft() -> NewDraft {
        let rules = RuleSet::for_mode(DraftMode::Classic);
        NewDraft {
            title: "Test draft".into(),
            league: "nba".into(),
            settings: DraftSettings {
                mode: DraftMode::Classic,
                slot_positions: default_layout(2, rules.position_enforced),
                rules,
                participants: 2,
                players_per_team: 2,
                era: Some(EraWindow::new(1990, 1999)),
                random_era: false,
                franchise: None,
                seats: vec![],
            },
        }
    }

    fn sample_pick(slot: u32, player_id: i64) -> DraftPick {
        DraftPick {
            slot,
            player_id,
            player_name: format!("Player {player_id}"),
            position: Position::PointGuard,
            season_used: Some(1996),
            franchise_used: Some("CHI".into()),
            era_used: Some(EraWindow::new(1990, 1999)),
            owner_index: 1,
            ppg_used: 30.4,
            rating_used: 88.5,
            auto: false,
            picked_by: Some("alice".into()),
            picked_at: Utc::now(),
        }
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(tables, vec!["draft_picks", "draft_votes", "drafts"]);
    }

    #[test]
    fn insert_and_fetch_draft() {
        let db = test_db();
        let draft = db.insert_draft(&new_draft()).unwrap();
        assert!(draft.id.starts_with("draft_"));
        assert_eq!(draft.status, DraftStatus::InProgress);
        assert!(draft.pending.is_empty());
        assert!(draft.picks.is_empty());

        let loaded = db.fetch_draft(&draft.id).unwrap();
        assert_eq!(loaded.settings, new_draft().settings);
    }

    #[test]
    fn missing_draft_is_not_found() {
        let db = test_db();
        assert!(matches!(
            db.fetch_draft("nope"),
            Err(RepositoryError::DraftNotFound { .. })
        ));
        assert!(matches!(
            db.insert_pick("nope", &sample_pick(1, 1), DraftStatus::InProgress),
            Err(RepositoryError::DraftNotFound { .. })
        ));
    }

    #[test]
    fn pick_round_trip_preserves_fields() {
        let db = test_db();
        let draft = db.insert_draft(&new_draft()).unwrap();
        let pick = sample_pick(1, 23);
        db.insert_pick(&draft.id, &pick, DraftStatus::InProgress).unwrap();

        let loaded = db.fetch_draft(&draft.id).unwrap();
        assert_eq!(loaded.picks.len(), 1);
        let got = &loaded.picks[0];
        assert_eq!(got.slot, 1);
        assert_eq!(got.player_id, 23);
        assert_eq!(got.position, Position::PointGuard);
        assert_eq!(got.era_used, Some(EraWindow::new(1990, 1999)));
        assert_eq!(got.picked_by.as_deref(), Some("alice"));
        assert_eq!(got.picked_at.timestamp(), pick.picked_at.timestamp());
    }

    #[test]
    fn second_insert_into_slot_is_slot_taken() {
        let db = test_db();
        let draft = db.insert_draft(&new_draft()).unwrap();
        db.insert_pick(&draft.id, &sample_pick(1, 1), DraftStatus::InProgress).unwrap();
        let err = db
            .insert_pick(&draft.id, &sample_pick(1, 2), DraftStatus::InProgress)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::SlotTaken { slot: 1, .. }));
        assert_eq!(db.fetch_draft(&draft.id).unwrap().picks.len(), 1);
    }

    #[test]
    fn same_player_twice_is_player_taken() {
        let db = test_db();
        let draft = db.insert_draft(&new_draft()).unwrap();
        db.insert_pick(&draft.id, &sample_pick(1, 7), DraftStatus::InProgress).unwrap();
        let err = db
            .insert_pick(&draft.id, &sample_pick(3, 7), DraftStatus::InProgress)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::PlayerTaken { player_id: 7, .. }));
    }

    #[test]
    fn pick_clears_pending_turn() {
        let db = test_db();
        let draft = db.insert_draft(&new_draft()).unwrap();
        let overlay = TurnOverlay {
            franchise: Some("BOS".into()),
            era: None,
        };
        let saved = db
            .merge_pending_turn(&draft.id, &overlay, Some(DraftStatus::Saved))
            .unwrap();
        assert_eq!(saved.pending, overlay);
        assert_eq!(saved.status, DraftStatus::Saved);

        db.insert_pick(&draft.id, &sample_pick(1, 1), DraftStatus::InProgress).unwrap();
        let after = db.fetch_draft(&draft.id).unwrap();
        assert!(after.pending.is_empty());
        assert_eq!(after.status, DraftStatus::InProgress);
    }

    #[test]
    fn merge_keeps_earlier_overlay_fields() {
        let db = test_db();
        let draft = db.insert_draft(&new_draft()).unwrap();
        db.merge_pending_turn(
            &draft.id,
            &TurnOverlay {
                franchise: Some("BOS".into()),
                era: None,
            },
            None,
        )
        .unwrap();
        let merged = db
            .merge_pending_turn(
                &draft.id,
                &TurnOverlay {
                    franchise: None,
                    era: Some(EraWindow::new(1980, 1989)),
                },
                None,
            )
            .unwrap();
        assert_eq!(merged.pending.franchise.as_deref(), Some("BOS"));
        assert_eq!(merged.pending.era, Some(EraWindow::new(1980, 1989)));
        assert_eq!(merged.status, DraftStatus::InProgress);
    }

    #[test]
    fn undo_reopens_complete_draft() {
        let db = test_db();
        let draft = db.insert_draft(&new_draft()).unwrap();
        db.insert_pick(&draft.id, &sample_pick(1, 1), DraftStatus::Complete).unwrap();
        assert!(db.delete_pick(&draft.id, 1).unwrap());
        assert!(!db.delete_pick(&draft.id, 1).unwrap());
        assert_eq!(db.fetch_draft(&draft.id).unwrap().status, DraftStatus::InProgress);
    }

    #[test]
    fn delete_draft_cascades() {
        let db = test_db();
        let draft = db.insert_draft(&new_draft()).unwrap();
        db.insert_pick(&draft.id, &sample_pick(1, 1), DraftStatus::InProgress).unwrap();
        db.upsert_vote(&draft.id, "bob", 1).unwrap();
        db.delete_draft(&draft.id).unwrap();

        assert!(matches!(
            db.fetch_draft(&draft.id),
            Err(RepositoryError::DraftNotFound { .. })
        ));
        let conn = db.conn();
        let leftover: i64 = conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM draft_picks) + (SELECT COUNT(*) FROM draft_votes)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(leftover, 0);
    }

    #[test]
    fn votes_replace_per_voter() {
        let db = test_db();
        let draft = db.insert_draft(&new_draft()).unwrap();
        db.upsert_vote(&draft.id, "bob", 1).unwrap();
        db.upsert_vote(&draft.id, "carol", 1).unwrap();
        db.upsert_vote(&draft.id, "bob", 2).unwrap();
        assert_eq!(
            db.votes_by_seat(&draft.id).unwrap(),
            vec![VoteCount { seat: 1, votes: 1 }, VoteCount { seat: 2, votes: 1 }]
        );
    }

    #[test]
    fn draft_ids_lists_every_draft() {
        let db = test_db();
        let a = db.insert_draft(&new_draft()).unwrap();
        let b = db.insert_draft(&new_draft()).unwrap();
        let ids = db.draft_ids().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.id) && ids.contains(&b.id));
    }

    #[test]
    fn generate_draft_id_format() {
        let id = Database::generate_draft_id();
        assert!(id.starts_with("draft_"));
        // draft_YYYYMMDD_HHMMSS_SSS_xxxx
        assert_eq!(id.len(), "draft_20260228_143022_123_abcd".len());
    }
}
