// Score report: per-seat aggregates recomputed from committed picks.
//
// Pure and deterministic: the same picks, rules, and catalog always give
// the same report, so two calls with no mutation in between are identical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use courtdraft_core::player::{Player, PlayerId, Position, SeasonStat};
use courtdraft_core::scoring::{self, TeamFit, Teammate};
use courtdraft_core::season::{select_season, FranchiseSource, SeasonQuery};
use courtdraft_core::validation::{roster_warnings, RosterLine};

use crate::draft::{Draft, DraftPick};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub draft_id: String,
    pub rules_version: u32,
    pub seats: Vec<SeatScore>,
    pub rule_warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatScore {
    pub seat: u32,
    pub team_score: f64,
    pub total_ppg: f64,
    pub total_rating: f64,
    pub picks: Vec<PickScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickScore {
    pub slot: u32,
    pub player_id: PlayerId,
    pub player_name: String,
    pub position: Position,
    pub season_used: Option<i32>,
    pub franchise_used: Option<String>,
    pub ppg: f64,
    pub rating: f64,
    pub score: f64,
}

impl ScoreReport {
    pub fn seat(&self, seat: u32) -> Option<&SeatScore> {
        self.seats.iter().find(|s| s.seat == seat)
    }
}

/// Build the report for every seat of `draft`. `players` holds the catalog
/// entries of the drafted players; a pick whose player is missing keeps
/// the values it was committed with and scores its stored rating.
pub fn build_report(draft: &Draft, players: &BTreeMap<PlayerId, Player>) -> ScoreReport {
    let mut rule_warnings = Vec::new();
    let seats = (1..=draft.settings.participants)
        .map(|seat| score_seat(draft, seat, players, &mut rule_warnings))
        .collect();

    ScoreReport {
        draft_id: draft.id.clone(),
        rules_version: draft.rules().version,
        seats,
        rule_warnings,
    }
}

fn score_seat(
    draft: &Draft,
    seat: u32,
    players: &BTreeMap<PlayerId, Player>,
    warnings: &mut Vec<String>,
) -> SeatScore {
    let mut teammates: Vec<Teammate> = Vec::new();
    let mut lines = Vec::new();
    let mut picks = Vec::new();

    for pick in draft.seat_picks(seat) {
        let era = pick.era_used.or(draft.settings.era);
        let Some(player) = players.get(&pick.player_id) else {
            warnings.push(format!(
                "seat {seat}: {} is no longer in the catalog",
                pick.player_name
            ));
            picks.push(stored_line(pick));
            teammates.push(Teammate {
                position: Some(pick.position),
                height_inches: None,
                usage_rate: 0.0,
            });
            continue;
        };

        let Some(stat) = resolve_committed(draft, pick, player) else {
            warnings.push(format!(
                "seat {seat}: season for {} could not be re-resolved",
                pick.player_name
            ));
            picks.push(stored_line(pick));
            teammates.push(Teammate {
                position: Some(pick.position),
                height_inches: player.height_inches,
                usage_rate: 0.0,
            });
            lines.push(RosterLine {
                player,
                points: pick.ppg_used,
                rating: pick.rating_used,
            });
            continue;
        };

        let fit = TeamFit {
            candidate_height: player.height_inches,
            teammates: &teammates,
        };
        let score = scoring::score(&stat, draft.slot_position(pick.slot), pick.position, era, &fit);
        let rating = scoring::standalone(&stat, pick.position, era);

        picks.push(PickScore {
            slot: pick.slot,
            player_id: pick.player_id,
            player_name: pick.player_name.clone(),
            position: pick.position,
            season_used: pick.season_used,
            franchise_used: pick.franchise_used.clone(),
            ppg: scoring::round1(stat.points),
            rating: scoring::round1(rating),
            score: scoring::round1(score),
        });
        teammates.push(Teammate {
            position: Some(pick.position),
            height_inches: player.height_inches,
            usage_rate: stat.usage_rate,
        });
        lines.push(RosterLine {
            player,
            points: stat.points,
            rating,
        });
    }

    warnings.extend(
        roster_warnings(draft.rules(), &lines)
            .into_iter()
            .map(|violation| format!("seat {seat}: {violation}")),
    );

    SeatScore {
        seat,
        team_score: scoring::round1(picks.iter().map(|p| p.score).sum()),
        total_ppg: scoring::round1(picks.iter().map(|p| p.ppg).sum()),
        total_rating: scoring::round1(picks.iter().map(|p| p.rating).sum()),
        picks,
    }
}

/// The season a pick was committed with. The recorded season short-cuts
/// the search; an averaged pick is rebuilt from its recorded window.
fn resolve_committed(draft: &Draft, pick: &DraftPick, player: &Player) -> Option<SeasonStat> {
    let query = SeasonQuery {
        mode: draft.rules().stat_mode,
        era: pick.era_used,
        franchise: pick
            .franchise_used
            .clone()
            .map(|code| (code, FranchiseSource::Draft)),
        season_override: None,
        franchise_override: None,
    }
    .committed(pick.season_used, pick.franchise_used.clone());
    select_season(player, &query).ok()
}

fn stored_line(pick: &DraftPick) -> PickScore {
    PickScore {
        slot: pick.slot,
        player_id: pick.player_id,
        player_name: pick.player_name.clone(),
        position: pick.position,
        season_used: pick.season_used,
        franchise_used: pick.franchise_used.clone(),
        ppg: scoring::round1(pick.ppg_used),
        rating: scoring::round1(pick.rating_used),
        score: scoring::round1(pick.rating_used),
    }
}
