// Season selection: which stat line represents a player in a draft.
//
// Candidate seasons are narrowed through fallback tiers, most specific
// first: era AND franchise, era alone, franchise alone, whole career. The
// first tier that leaves anything is handed to the stat mode (peak or
// average).

use thiserror::Error;
use tracing::debug;

use crate::player::{Player, PlayerId, SeasonStat};
use crate::rules::{EraWindow, RuleSet, StatMode};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("player {player_id} has no seasons in the catalog")]
    NoSeasons { player_id: PlayerId },

    #[error("player {player_id} never played for {franchise}")]
    NoFranchiseMatch {
        player_id: PlayerId,
        franchise: String,
    },
}

/// Where the franchise constraint of a query came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FranchiseSource {
    /// Supplied with the pick or locked for this turn. A player with no
    /// season at all on it is rejected instead of falling back.
    Explicit,
    /// The draft-wide constraint. Falls back like any other filter.
    Draft,
}

/// Everything the selector needs besides the player.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonQuery {
    pub mode: StatMode,
    pub era: Option<EraWindow>,
    pub franchise: Option<(String, FranchiseSource)>,
    /// The season already committed for this pick. Short-circuits the search.
    pub season_override: Option<i32>,
    /// Franchise recorded with the committed season, to pick the right
    /// stint when a player changed teams mid-season.
    pub franchise_override: Option<String>,
}

impl SeasonQuery {
    /// Build the query a pick would run under `rules`.
    ///
    /// The draft-level era and franchise only participate when the stat
    /// mode uses them; an explicit franchise always participates.
    pub fn for_pick(
        rules: &RuleSet,
        era: Option<EraWindow>,
        explicit_franchise: Option<&str>,
        draft_franchise: Option<&str>,
    ) -> Self {
        let franchise = match (explicit_franchise, draft_franchise) {
            (Some(code), _) => Some((code.to_string(), FranchiseSource::Explicit)),
            (None, Some(code)) if rules.stat_mode.uses_franchise() => {
                Some((code.to_string(), FranchiseSource::Draft))
            }
            _ => None,
        };
        SeasonQuery {
            mode: rules.stat_mode,
            era: era.filter(|_| rules.stat_mode.uses_era()),
            franchise,
            season_override: None,
            franchise_override: None,
        }
    }

    /// A query that re-resolves a committed pick.
    pub fn committed(mut self, season: Option<i32>, franchise: Option<String>) -> Self {
        self.season_override = season;
        self.franchise_override = franchise;
        self
    }
}

/// Choose the single season (or synthesized average) that represents
/// `player` under `query`.
pub fn select_season(player: &Player, query: &SeasonQuery) -> Result<SeasonStat, SelectionError> {
    if player.seasons.is_empty() {
        return Err(SelectionError::NoSeasons {
            player_id: player.id,
        });
    }

    if let Some(year) = query.season_override {
        if let Some(found) = committed_season(player, year, query.franchise_override.as_deref()) {
            return Ok(found.clone());
        }
        debug!(
            "player {}: committed season {year} is gone, searching again",
            player.id
        );
    }

    let franchise = query.franchise.as_ref();
    if let Some((code, FranchiseSource::Explicit)) = franchise {
        if !player.seasons.iter().any(|s| s.is_on_franchise(code)) {
            return Err(SelectionError::NoFranchiseMatch {
                player_id: player.id,
                franchise: code.clone(),
            });
        }
    }

    let tier = candidate_tier(&player.seasons, query.era, franchise.map(|(c, _)| c.as_str()));

    if query.mode.is_peak() {
        Ok(peak_season(&tier).clone())
    } else {
        Ok(average_season(&tier))
    }
}

fn committed_season<'a>(
    player: &'a Player,
    year: i32,
    franchise: Option<&str>,
) -> Option<&'a SeasonStat> {
    let mut in_year = player.seasons.iter().filter(|s| s.season == Some(year));
    match franchise {
        Some(code) => player
            .seasons
            .iter()
            .find(|s| s.season == Some(year) && s.is_on_franchise(code))
            .or_else(|| in_year.next()),
        None => in_year.next(),
    }
}

/// The first non-empty fallback tier. Never empty: the last tier is the
/// whole career and the caller guarantees it has at least one season.
fn candidate_tier<'a>(
    seasons: &'a [SeasonStat],
    era: Option<EraWindow>,
    franchise: Option<&str>,
) -> Vec<&'a SeasonStat> {
    let in_era = |s: &SeasonStat| match (era, s.season) {
        (Some(window), Some(year)) => window.contains(year),
        (Some(_), None) => false,
        (None, _) => true,
    };
    let on_franchise = |s: &SeasonStat| franchise.map_or(true, |code| s.is_on_franchise(code));

    // (filter by era, filter by franchise)
    let tiers = [(true, true), (true, false), (false, true)];
    for (by_era, by_franchise) in tiers {
        let tier: Vec<&SeasonStat> = seasons
            .iter()
            .filter(|s| (!by_era || in_era(s)) && (!by_franchise || on_franchise(s)))
            .collect();
        if !tier.is_empty() {
            return tier;
        }
    }
    seasons.iter().collect()
}

/// Highest points per game; ties go to the earlier season.
fn peak_season<'a>(tier: &[&'a SeasonStat]) -> &'a SeasonStat {
    let mut best = tier[0];
    for &candidate in &tier[1..] {
        if candidate.points > best.points {
            best = candidate;
        }
    }
    best
}

/// Field-by-field arithmetic mean. Season and franchise are left unset.
fn average_season(tier: &[&SeasonStat]) -> SeasonStat {
    let n = tier.len() as f64;
    let mean = |field: fn(&SeasonStat) -> f64| tier.iter().map(|s| field(s)).sum::<f64>() / n;
    SeasonStat {
        season: None,
        franchise: None,
        games: mean(|s| s.games),
        points: mean(|s| s.points),
        assists: mean(|s| s.assists),
        rebounds: mean(|s| s.rebounds),
        steals: mean(|s| s.steals),
        blocks: mean(|s| s.blocks),
        fg_pct: mean(|s| s.fg_pct),
        ts_pct: mean(|s| s.ts_pct),
        three_rate: mean(|s| s.three_rate),
        usage_rate: mean(|s| s.usage_rate),
        per: mean(|s| s.per),
        bpm: mean(|s| s.bpm),
        ws_per_48: mean(|s| s.ws_per_48),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Position;
    use crate::rules::{DraftMode, RuleSet};

    fn season(year: i32, team: &str, points: f64) -> SeasonStat {
        SeasonStat {
            season: Some(year),
            franchise: Some(team.to_string()),
            games: 80.0,
            points,
            assists: 5.0,
            ..SeasonStat::default()
        }
    }

    fn player(seasons: Vec<SeasonStat>) -> Player {
        Player {
            id: 7,
            name: "Test Player".into(),
            positions: vec![Position::SmallForward],
            height_inches: Some(79),
            hall_of_fame: false,
            franchises: vec![],
            seasons,
        }
    }

    fn query(mode: StatMode, era: Option<EraWindow>, franchise: Option<(&str, FranchiseSource)>) -> SeasonQuery {
        SeasonQuery {
            mode,
            era,
            franchise: franchise.map(|(c, src)| (c.to_string(), src)),
            season_override: None,
            franchise_override: None,
        }
    }

    #[test]
    fn peak_picks_highest_scoring_season() {
        let p = player(vec![
            season(1990, "BOS", 18.0),
            season(1991, "BOS", 27.5),
            season(1992, "BOS", 22.0),
        ]);
        let chosen = select_season(&p, &query(StatMode::Peak, None, None)).unwrap();
        assert_eq!(chosen.season, Some(1991));
    }

    #[test]
    fn peak_ties_go_to_earlier_season() {
        let p = player(vec![season(1990, "BOS", 20.0), season(1994, "BOS", 20.0)]);
        let chosen = select_season(&p, &query(StatMode::Peak, None, None)).unwrap();
        assert_eq!(chosen.season, Some(1990));
    }

    #[test]
    fn era_and_franchise_tier_wins_when_populated() {
        let p = player(vec![
            season(1985, "SEA", 30.0),
            season(1995, "SEA", 21.0),
            season(1996, "LAL", 25.0),
        ]);
        let q = query(
            StatMode::PeakEraTeam,
            Some(EraWindow::new(1990, 1999)),
            Some(("OKC", FranchiseSource::Draft)),
        );
        let chosen = select_season(&p, &q).unwrap();
        assert_eq!(chosen.season, Some(1995));
    }

    #[test]
    fn falls_back_to_era_then_franchise() {
        let p = player(vec![season(1985, "BOS", 30.0), season(1995, "LAL", 21.0)]);

        let era_only = query(
            StatMode::PeakEraTeam,
            Some(EraWindow::new(1990, 1999)),
            Some(("BOS", FranchiseSource::Draft)),
        );
        assert_eq!(select_season(&p, &era_only).unwrap().season, Some(1995));

        let franchise_only = query(
            StatMode::PeakEraTeam,
            Some(EraWindow::new(2010, 2019)),
            Some(("BOS", FranchiseSource::Draft)),
        );
        assert_eq!(select_season(&p, &franchise_only).unwrap().season, Some(1985));
    }

    #[test]
    fn out_of_era_player_falls_through_to_career_peak() {
        let p = player(vec![season(1960, "SYR", 24.0), season(1962, "SYR", 31.0)]);
        let q = query(
            StatMode::PeakEraTeam,
            Some(EraWindow::new(2000, 2009)),
            Some(("MIA", FranchiseSource::Draft)),
        );
        let chosen = select_season(&p, &q).unwrap();
        assert_eq!(chosen.season, Some(1962));
    }

    #[test]
    fn explicit_franchise_without_any_match_is_rejected() {
        let p = player(vec![season(1960, "SYR", 24.0)]);
        let q = query(
            StatMode::PeakEraTeam,
            Some(EraWindow::new(2000, 2009)),
            Some(("MIA", FranchiseSource::Explicit)),
        );
        assert_eq!(
            select_season(&p, &q),
            Err(SelectionError::NoFranchiseMatch {
                player_id: 7,
                franchise: "MIA".into()
            })
        );
    }

    #[test]
    fn explicit_franchise_matches_historical_code() {
        let p = player(vec![season(1960, "SYR", 24.0), season(1970, "BOS", 26.0)]);
        let q = query(StatMode::PeakTeam, None, Some(("PHI", FranchiseSource::Explicit)));
        assert_eq!(select_season(&p, &q).unwrap().season, Some(1960));
    }

    #[test]
    fn era_window_includes_prior_calendar_year() {
        let p = player(vec![season(1989, "DET", 19.0), season(1975, "DET", 28.0)]);
        let q = query(StatMode::PeakEra, Some(EraWindow::new(1990, 1999)), None);
        assert_eq!(select_season(&p, &q).unwrap().season, Some(1989));
    }

    #[test]
    fn average_synthesizes_mean_without_year_or_team() {
        let p = player(vec![season(2001, "MIA", 20.0), season(2002, "MIA", 30.0)]);
        let avg = select_season(&p, &query(StatMode::Average, None, None)).unwrap();
        assert_eq!(avg.season, None);
        assert_eq!(avg.franchise, None);
        assert!((avg.points - 25.0).abs() < 1e-9);
        assert!((avg.assists - 5.0).abs() < 1e-9);
    }

    #[test]
    fn committed_season_short_circuits_filters() {
        let p = player(vec![season(1985, "BOS", 30.0), season(1995, "LAL", 21.0)]);
        let q = query(StatMode::Peak, Some(EraWindow::new(2010, 2019)), None)
            .committed(Some(1995), Some("LAL".into()));
        assert_eq!(select_season(&p, &q).unwrap().season, Some(1995));
    }

    #[test]
    fn committed_season_missing_falls_back_to_search() {
        let p = player(vec![season(1985, "BOS", 30.0)]);
        let q = query(StatMode::Peak, None, None).committed(Some(1999), None);
        assert_eq!(select_season(&p, &q).unwrap().season, Some(1985));
    }

    #[test]
    fn no_seasons_is_rejected() {
        let p = player(vec![]);
        assert_eq!(
            select_season(&p, &query(StatMode::Peak, None, None)),
            Err(SelectionError::NoSeasons { player_id: 7 })
        );
    }

    #[test]
    fn for_pick_drops_filters_the_mode_ignores() {
        let rules = RuleSet::for_mode(DraftMode::Free);
        let q = SeasonQuery::for_pick(&rules, Some(EraWindow::new(1990, 1999)), None, Some("BOS"));
        assert_eq!(q.era, None);
        assert_eq!(q.franchise, None);

        let q = SeasonQuery::for_pick(&rules, None, Some("BOS"), None);
        assert_eq!(q.franchise, Some(("BOS".into(), FranchiseSource::Explicit)));
    }
}
