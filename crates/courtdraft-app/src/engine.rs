// Draft state machine: every transition a draft can go through.
//
// The engine itself holds no per-draft state. Each call loads the draft
// from the repository, so callers must serialize calls for one draft (the
// draft actor does) to keep turn derivation consistent.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, warn};

use courtdraft_core::player::{Player, PlayerId, Position};
use courtdraft_core::rules::{EraWindow, RuleSet, TurnOverlay};
use courtdraft_core::scoring;
use courtdraft_core::season::{select_season, SeasonQuery};
use courtdraft_core::validation::{check_commit, RosterLine};

use crate::catalog::{PlayerFilter, SeasonCatalog};
use crate::config::DraftDefaults;
use crate::draft::state::default_layout;
use crate::draft::{
    Draft, DraftConfig, DraftPick, DraftSettings, DraftStatus, NewDraft, PickRequest, Turn,
    VoteCount,
};
use crate::error::DraftError;
use crate::notify::{DraftEvent, NotificationSink};
use crate::repository::DraftRepository;
use crate::score::{build_report, ScoreReport};

/// First and last decade a random era window can start in.
const RANDOM_ERA_FIRST_DECADE: i32 = 1950;
const RANDOM_ERA_LAST_DECADE: i32 = 2020;

const DEFAULT_SEARCH_LIMIT: usize = 25;
const MAX_SEARCH_LIMIT: usize = 200;

pub struct DraftEngine {
    repo: Arc<dyn DraftRepository>,
    catalog: Arc<dyn SeasonCatalog>,
    sink: Arc<dyn NotificationSink>,
    defaults: DraftDefaults,
}

impl DraftEngine {
    pub fn new(
        repo: Arc<dyn DraftRepository>,
        catalog: Arc<dyn SeasonCatalog>,
        sink: Arc<dyn NotificationSink>,
        defaults: DraftDefaults,
    ) -> Self {
        DraftEngine {
            repo,
            catalog,
            sink,
            defaults,
        }
    }

    pub fn repository(&self) -> &Arc<dyn DraftRepository> {
        &self.repo
    }

    pub fn defaults(&self) -> &DraftDefaults {
        &self.defaults
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create a draft with its rule set frozen from the mode defaults plus
    /// the caller's overrides.
    pub async fn create_draft(&self, config: DraftConfig) -> Result<Draft, DraftError> {
        config.validate()?;

        let mut rules = RuleSet::merged(config.mode, &config.rules);
        if rules.auto_pick_enabled && rules.pick_timer_seconds.is_none() {
            rules.pick_timer_seconds = self.defaults.default_pick_timer_seconds;
        }
        if let Some(anchor) = rules.played_with_player_id {
            if self.catalog.find_player(anchor).await?.is_none() {
                return Err(DraftError::InvalidConfig {
                    reason: format!("played-with player {anchor} is not in the catalog"),
                });
            }
        }

        let era = if config.random_era {
            Some(random_era())
        } else {
            config.era
        };
        let slot_positions = config
            .slot_positions
            .clone()
            .unwrap_or_else(|| default_layout(config.players_per_team, rules.position_enforced));

        let new = NewDraft {
            title: config.title,
            league: config.league,
            settings: DraftSettings {
                mode: config.mode,
                rules,
                participants: config.participants,
                players_per_team: config.players_per_team,
                era,
                random_era: config.random_era,
                franchise: config.franchise,
                seats: config.seats,
                slot_positions,
            },
        };

        let draft = self.repo.create_draft(&new).await?;
        info!(
            "Created draft {} ({} mode, {} seats x {} slots)",
            draft.id, draft.settings.mode, draft.settings.participants, draft.settings.players_per_team
        );
        self.sink.publish(DraftEvent::changed(&draft)).await;
        Ok(draft)
    }

    pub async fn snapshot(&self, draft_id: &str) -> Result<Draft, DraftError> {
        Ok(self.repo.load_draft(draft_id).await?)
    }

    /// Delete the draft with its picks and votes. Irreversible.
    pub async fn cancel_draft(&self, draft_id: &str) -> Result<(), DraftError> {
        self.repo.delete_draft_cascade(draft_id).await?;
        info!("Cancelled draft {draft_id}");
        self.sink.publish(DraftEvent::cancelled(draft_id)).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Picks
    // -----------------------------------------------------------------------

    /// Validate and commit one pick.
    ///
    /// `auto` marks a pick made by the turn timer; it skips the online seat
    /// identity check and is recorded on the pick.
    pub async fn submit_pick(
        &self,
        draft_id: &str,
        req: PickRequest,
        auto: bool,
    ) -> Result<Draft, DraftError> {
        let draft = self.repo.load_draft(draft_id).await?;
        let turn = check_turn(&draft, &req, auto)?;

        let player = self
            .catalog
            .find_player(req.player_id)
            .await?
            .ok_or_else(|| DraftError::NotFound {
                what: format!("player {}", req.player_id),
            })?;
        if draft.has_player(player.id) {
            return Err(DraftError::DuplicatePlayer {
                player_id: player.id,
            });
        }

        let position = resolve_position(&draft, req.slot, req.position_hint, &player)?;

        let rules = draft.rules();
        let explicit_franchise = req
            .franchise
            .as_deref()
            .or(draft.pending.franchise.as_deref());
        let mut query = SeasonQuery::for_pick(
            rules,
            draft.settings.era,
            explicit_franchise,
            draft.settings.franchise.as_deref(),
        );
        // A turn lock or an explicit era applies whatever the stat mode.
        query.era = req.era.or(draft.pending.era).or(query.era);
        let stat = select_season(&player, &query)?;

        let era_context = query.era.or(draft.settings.era);
        let rating = scoring::standalone(&stat, position, era_context);

        let seat_players = self.seat_players(&draft, turn.seat).await?;
        let seat_lines: Vec<RosterLine<'_>> = draft
            .seat_picks(turn.seat)
            .into_iter()
            .filter_map(|pick| {
                seat_players.get(&pick.player_id).map(|player| RosterLine {
                    player,
                    points: pick.ppg_used,
                    rating: pick.rating_used,
                })
            })
            .collect();
        let anchor = self.played_with_anchor(rules).await?;
        let candidate = RosterLine {
            player: &player,
            points: stat.points,
            rating,
        };
        check_commit(rules, &seat_lines, &candidate, anchor.as_ref())?;

        let franchise_used = stat
            .franchise
            .clone()
            .or_else(|| query.franchise.as_ref().map(|(code, _)| code.clone()));
        let pick = DraftPick {
            slot: req.slot,
            player_id: player.id,
            player_name: player.name.clone(),
            position,
            season_used: stat.season,
            franchise_used,
            era_used: query.era,
            owner_index: turn.seat,
            ppg_used: stat.points,
            rating_used: rating,
            auto,
            picked_by: if auto { None } else { req.actor.clone() },
            picked_at: Utc::now(),
        };

        let status = if draft.picks.len() + 1 >= draft.max_players() as usize {
            DraftStatus::Complete
        } else {
            DraftStatus::InProgress
        };
        self.repo.append_pick(draft_id, &pick, status).await?;

        info!(
            "Draft {draft_id}: seat {} took {} ({}) in slot {}{}",
            turn.seat,
            pick.player_name,
            pick.position,
            pick.slot,
            if auto { " [auto]" } else { "" }
        );

        let updated = self.repo.load_draft(draft_id).await?;
        if updated.status == DraftStatus::Complete {
            info!("Draft {draft_id} complete");
        }
        self.sink.publish(DraftEvent::changed(&updated)).await;
        Ok(updated)
    }

    /// Remove the pick at `slot`. A slot with no pick is left alone.
    pub async fn undo_pick(&self, draft_id: &str, slot: u32) -> Result<Draft, DraftError> {
        let draft = self.repo.load_draft(draft_id).await?;
        if draft.is_online() {
            return Err(DraftError::UndoNotAllowed);
        }
        if !self.repo.remove_pick(draft_id, slot).await? {
            debug!("Draft {draft_id}: undo of empty slot {slot} ignored");
            return Ok(draft);
        }
        info!("Draft {draft_id}: undid slot {slot}");
        let updated = self.repo.load_draft(draft_id).await?;
        self.sink.publish(DraftEvent::changed(&updated)).await;
        Ok(updated)
    }

    /// Merge a per-turn overlay and optionally update the status tag.
    ///
    /// `complete` is reached only through the final pick and a complete
    /// draft keeps that tag.
    pub async fn save_transient_state(
        &self,
        draft_id: &str,
        overlay: TurnOverlay,
        status: Option<DraftStatus>,
    ) -> Result<Draft, DraftError> {
        let draft = self.repo.load_draft(draft_id).await?;
        let status = match status {
            Some(DraftStatus::Complete) if !draft.is_complete() => {
                return Err(DraftError::InvalidConfig {
                    reason: "status `complete` is set by the final pick".into(),
                });
            }
            _ if draft.is_complete() => None,
            other => other,
        };

        let updated = self
            .repo
            .merge_rule_overlay(draft_id, &overlay, status)
            .await?;
        info!(
            "Draft {draft_id}: saved turn state (franchise={:?}, era={:?}, status={})",
            updated.pending.franchise, updated.pending.era, updated.status
        );
        self.sink.publish(DraftEvent::changed(&updated)).await;
        Ok(updated)
    }

    /// Fill the current turn with a random eligible candidate.
    ///
    /// Only the turn timer calls this. The draw is uniform over the whole
    /// pool `search_candidates` shows, scanned one catalog page at a time.
    pub async fn auto_pick(&self, draft_id: &str) -> Result<Draft, DraftError> {
        let draft = self.repo.load_draft(draft_id).await?;
        let turn = draft
            .current_turn()
            .ok_or_else(|| DraftError::turn("draft is complete"))?;

        let mut filter = candidate_filter(&draft, turn.slot);
        filter.limit = self.defaults.auto_pick_page_size.max(1);
        let mut seen = 0usize;
        let mut choice: Option<Player> = None;
        loop {
            let page = self.catalog.search_players(&filter).await?;
            let page_len = page.len();
            for candidate in page {
                seen += 1;
                // Keep the nth candidate with probability 1/n.
                if rand::thread_rng().gen_range(0..seen) == 0 {
                    choice = Some(candidate);
                }
            }
            if page_len < filter.limit {
                break;
            }
            filter.offset += page_len;
        }
        let Some(choice) = choice else {
            return Err(DraftError::NotFound {
                what: format!("eligible candidate for slot {}", turn.slot),
            });
        };
        debug!(
            "Draft {draft_id}: auto-pick drew {} from a pool of {seen}",
            choice.name
        );

        let mut req = PickRequest::new(turn.slot, choice.id);
        if draft.slot_position(turn.slot).is_none() {
            req.position_hint = choice.primary_position();
        }
        self.submit_pick(draft_id, req, true).await
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Candidates for the current turn: the auto-pick pool, narrowed by
    /// name and paged.
    pub async fn search_candidates(
        &self,
        draft_id: &str,
        text: Option<String>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Player>, DraftError> {
        let draft = self.repo.load_draft(draft_id).await?;
        let slot = draft.current_turn().map(|t| t.slot).unwrap_or(0);
        let mut filter = candidate_filter(&draft, slot);
        filter.text = text;
        filter.limit = match limit {
            0 => DEFAULT_SEARCH_LIMIT,
            n => n.min(MAX_SEARCH_LIMIT),
        };
        filter.offset = offset;
        Ok(self.catalog.search_players(&filter).await?)
    }

    /// Recompute the score report from the committed picks.
    pub async fn score_draft(&self, draft_id: &str) -> Result<ScoreReport, DraftError> {
        let draft = self.repo.load_draft(draft_id).await?;
        let mut players = BTreeMap::new();
        for pick in &draft.picks {
            if let Some(player) = self.catalog.find_player(pick.player_id).await? {
                players.insert(player.id, player);
            }
        }
        Ok(build_report(&draft, &players))
    }

    /// Record `voter`'s pick for the best roster.
    pub async fn record_vote(&self, draft_id: &str, voter: &str, seat: u32) -> Result<(), DraftError> {
        let draft = self.repo.load_draft(draft_id).await?;
        if seat == 0 || seat > draft.settings.participants {
            return Err(DraftError::InvalidConfig {
                reason: format!(
                    "seat {seat} is not in 1..={}",
                    draft.settings.participants
                ),
            });
        }
        self.repo.record_vote(draft_id, voter, seat).await?;
        debug!("Draft {draft_id}: {voter} voted for seat {seat}");
        Ok(())
    }

    /// Best-roster votes per seat.
    pub async fn vote_tally(&self, draft_id: &str) -> Result<Vec<VoteCount>, DraftError> {
        self.repo.load_draft(draft_id).await?;
        Ok(self.repo.vote_tally(draft_id).await?)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Catalog entries for a seat's committed picks. A player that has left
    /// the catalog is stood in for from the pick itself.
    async fn seat_players(
        &self,
        draft: &Draft,
        seat: u32,
    ) -> Result<BTreeMap<PlayerId, Player>, DraftError> {
        let mut players = BTreeMap::new();
        for pick in draft.seat_picks(seat) {
            let player = match self.catalog.find_player(pick.player_id).await? {
                Some(player) => player,
                None => {
                    warn!(
                        "Draft {}: player {} in slot {} is missing from the catalog",
                        draft.id, pick.player_id, pick.slot
                    );
                    stand_in_player(pick)
                }
            };
            players.insert(pick.player_id, player);
        }
        Ok(players)
    }

    async fn played_with_anchor(&self, rules: &RuleSet) -> Result<Option<Player>, DraftError> {
        let Some(anchor_id) = rules.played_with_player_id else {
            return Ok(None);
        };
        match self.catalog.find_player(anchor_id).await? {
            Some(anchor) => Ok(Some(anchor)),
            None => Err(DraftError::NotFound {
                what: format!("played-with player {anchor_id}"),
            }),
        }
    }
}

/// Turn checks, in order: draft open, slot in range, slot empty, slot
/// owned by the seat on the clock, slot is that seat's next slot, and in
/// online rooms the actor is that seat's identity.
fn check_turn(draft: &Draft, req: &PickRequest, auto: bool) -> Result<Turn, DraftError> {
    let turn = draft
        .current_turn()
        .ok_or_else(|| DraftError::turn("draft is complete"))?;

    if !draft.is_valid_slot(req.slot) {
        return Err(DraftError::turn(format!(
            "slot {} is outside 1..={}",
            req.slot,
            draft.max_players()
        )));
    }
    if draft.is_filled(req.slot) {
        return Err(DraftError::turn(format!("slot {} is already filled", req.slot)));
    }
    let owner = draft.owner_of(req.slot);
    if owner != turn.seat {
        return Err(DraftError::turn(format!(
            "slot {} belongs to seat {owner}, but seat {} is on the clock",
            req.slot, turn.seat
        )));
    }
    if req.slot != turn.slot {
        return Err(DraftError::turn(format!(
            "seat {} must fill slot {} next",
            turn.seat, turn.slot
        )));
    }

    if draft.is_online() && !auto {
        let expected = draft.seat_identity(turn.seat);
        if req.actor.as_deref() != expected {
            return Err(DraftError::turn(format!(
                "seat {} belongs to {}, not {}",
                turn.seat,
                expected.unwrap_or("nobody"),
                req.actor.as_deref().unwrap_or("an anonymous client")
            )));
        }
    }

    Ok(turn)
}

/// The position the player fills in `slot`.
///
/// A slot with a required position takes it. An open slot takes the hint
/// (checked against the player's positions when positions are enforced)
/// and otherwise the player's primary position.
fn resolve_position(
    draft: &Draft,
    slot: u32,
    hint: Option<Position>,
    player: &Player,
) -> Result<Position, DraftError> {
    let ineligible = |position: Position| DraftError::EligibilityViolation {
        reason: format!("{} is not eligible at {position}", player.name),
    };

    if let Some(required) = draft.slot_position(slot) {
        return if player.is_eligible_at(required) {
            Ok(required)
        } else {
            Err(ineligible(required))
        };
    }

    match hint {
        Some(position) if draft.rules().position_enforced && !player.is_eligible_at(position) => {
            Err(ineligible(position))
        }
        Some(position) => Ok(position),
        None => player
            .primary_position()
            .ok_or_else(|| DraftError::EligibilityViolation {
                reason: format!("{} has no listed position", player.name),
            }),
    }
}

/// The candidate pool for `slot`: position, era, franchise, hall-of-fame
/// and multi-franchise filters, minus players already drafted.
fn candidate_filter(draft: &Draft, slot: u32) -> PlayerFilter {
    let rules = draft.rules();
    let era = draft
        .pending
        .era
        .or(draft.settings.era.filter(|_| rules.stat_mode.uses_era()));
    let franchise = draft.pending.franchise.clone().or_else(|| {
        draft
            .settings
            .franchise
            .clone()
            .filter(|_| rules.stat_mode.uses_franchise())
    });
    PlayerFilter {
        text: None,
        position: draft.slot_position(slot),
        era,
        franchise,
        hall_rule: rules.hall_rule,
        multi_franchise_only: rules.multi_team_only,
        exclude: draft.picks.iter().map(|p| p.player_id).collect(),
        limit: DEFAULT_SEARCH_LIMIT,
        offset: 0,
    }
}

fn stand_in_player(pick: &DraftPick) -> Player {
    Player {
        id: pick.player_id,
        name: pick.player_name.clone(),
        positions: vec![pick.position],
        height_inches: None,
        hall_of_fame: false,
        franchises: pick.franchise_used.iter().cloned().collect(),
        seasons: Vec::new(),
    }
}

/// A decade-aligned era window between the first and last random decade.
fn random_era() -> EraWindow {
    let decades = (RANDOM_ERA_LAST_DECADE - RANDOM_ERA_FIRST_DECADE) / 10;
    let from = RANDOM_ERA_FIRST_DECADE + 10 * rand::thread_rng().gen_range(0..=decades);
    EraWindow::new(from, from + 9)
}
