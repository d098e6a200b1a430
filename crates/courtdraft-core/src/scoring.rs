// Scoring engine: a bounded 0..=100 rating for one season in one slot.
//
//   score = clamp(era_adjust(base + advanced) + compatibility, 0, 100)
//
// base          0..=50   per-game production normalized against elite marks
// advanced      0..=50   efficiency/impact composite scaled by usage
// era_adjust    ±10      three-point reliance relative to the era
// compatibility ±10      fit with teammates already on the roster

use crate::player::{Position, SeasonStat};
use crate::rules::EraWindow;

// ---------------------------------------------------------------------------
// Fixed design parameters
// ---------------------------------------------------------------------------

/// Per-game marks treated as the ceiling of each base category.
const ELITE_POINTS: f64 = 30.0;
const ELITE_ASSISTS: f64 = 10.0;
const ELITE_REBOUNDS: f64 = 13.0;
const ELITE_STOCKS: f64 = 4.0;
/// True-shooting (or field-goal) percentage mapped onto 0..=1.
const EFFICIENCY_FLOOR: f64 = 0.45;
const EFFICIENCY_CEILING: f64 = 0.65;

const ELITE_PER: f64 = 30.0;
const BPM_FLOOR: f64 = -5.0;
const BPM_CEILING: f64 = 12.0;
const ELITE_WS_PER_48: f64 = 0.300;
const ADVANCED_SCALE: f64 = 35.0;
const ADVANCED_MAX: f64 = 50.0;
/// Usage rate at which the advanced contribution is neither damped nor amplified.
const REFERENCE_USAGE: f64 = 20.0;

/// Era midpoints before this year penalize three-point reliance.
const PRE_THREE_POINT_ERA: f64 = 1980.0;
/// Era midpoints from this year on reward it.
const THREE_POINT_ERA: f64 = 2005.0;
/// A three-point attempt share treated as full reliance.
const HEAVY_THREE_RATE: f64 = 0.40;
const ERA_ADJUST_MAX: f64 = 10.0;

const COMPATIBILITY_MAX: f64 = 10.0;
const REDUNDANCY_MAX: f64 = 4.0;
const HEIGHT_FIT_MAX: f64 = 3.0;
const USAGE_FIT_MAX: f64 = 3.0;
const STAR_HEAVY_USAGE: f64 = 25.0;
const ROLE_HEAVY_USAGE: f64 = 18.0;

/// Base-category weights for one position. Each set sums to 50.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseWeights {
    pub points: f64,
    pub assists: f64,
    pub rebounds: f64,
    pub defense: f64,
    pub efficiency: f64,
}

impl BaseWeights {
    pub fn for_position(position: Position) -> Self {
        match position {
            Position::PointGuard => BaseWeights {
                points: 18.0,
                assists: 14.0,
                rebounds: 4.0,
                defense: 6.0,
                efficiency: 8.0,
            },
            Position::ShootingGuard => BaseWeights {
                points: 22.0,
                assists: 8.0,
                rebounds: 5.0,
                defense: 6.0,
                efficiency: 9.0,
            },
            Position::SmallForward => BaseWeights {
                points: 20.0,
                assists: 7.0,
                rebounds: 8.0,
                defense: 7.0,
                efficiency: 8.0,
            },
            Position::PowerForward => BaseWeights {
                points: 18.0,
                assists: 5.0,
                rebounds: 13.0,
                defense: 7.0,
                efficiency: 7.0,
            },
            Position::Center => BaseWeights {
                points: 16.0,
                assists: 4.0,
                rebounds: 15.0,
                defense: 9.0,
                efficiency: 6.0,
            },
        }
    }

    pub fn total(&self) -> f64 {
        self.points + self.assists + self.rebounds + self.defense + self.efficiency
    }
}

// ---------------------------------------------------------------------------
// Team-fit context
// ---------------------------------------------------------------------------

/// What the compatibility term needs to know about a rostered teammate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Teammate {
    pub position: Option<Position>,
    pub height_inches: Option<u16>,
    pub usage_rate: f64,
}

/// The candidate's physical profile plus the seat's roster so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamFit<'a> {
    pub candidate_height: Option<u16>,
    pub teammates: &'a [Teammate],
}

impl TeamFit<'static> {
    pub fn empty(candidate_height: Option<u16>) -> Self {
        TeamFit {
            candidate_height,
            teammates: &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Score terms
// ---------------------------------------------------------------------------

fn unit(value: f64, elite: f64) -> f64 {
    if elite <= 0.0 {
        return 0.0;
    }
    (value / elite).clamp(0.0, 1.0)
}

fn unit_range(value: f64, floor: f64, ceiling: f64) -> f64 {
    ((value - floor) / (ceiling - floor)).clamp(0.0, 1.0)
}

/// Shooting efficiency on 0..=1, preferring true shooting when recorded.
fn efficiency(stat: &SeasonStat) -> f64 {
    let pct = if stat.ts_pct > 0.0 { stat.ts_pct } else { stat.fg_pct };
    unit_range(pct, EFFICIENCY_FLOOR, EFFICIENCY_CEILING)
}

/// Weighted, normalized per-game production on 0..=50.
pub fn base(stat: &SeasonStat, position: Position) -> f64 {
    let w = BaseWeights::for_position(position);
    w.points * unit(stat.points, ELITE_POINTS)
        + w.assists * unit(stat.assists, ELITE_ASSISTS)
        + w.rebounds * unit(stat.rebounds, ELITE_REBOUNDS)
        + w.defense * unit(stat.steals + stat.blocks, ELITE_STOCKS)
        + w.efficiency * efficiency(stat)
}

/// Usage multiplier applied to the advanced composite, 0.5..=1.5.
pub fn usage_multiplier(usage_rate: f64) -> f64 {
    (usage_rate / REFERENCE_USAGE).clamp(0.5, 1.5)
}

/// Efficiency/impact composite on 0..=50.
pub fn advanced(stat: &SeasonStat) -> f64 {
    let composite = 0.35 * unit(stat.per, ELITE_PER)
        + 0.30 * unit_range(stat.bpm, BPM_FLOOR, BPM_CEILING)
        + 0.20 * unit(stat.ws_per_48, ELITE_WS_PER_48)
        + 0.15 * efficiency(stat);
    (composite * ADVANCED_SCALE * usage_multiplier(stat.usage_rate)).clamp(0.0, ADVANCED_MAX)
}

/// Add or subtract up to 10 points for three-point reliance.
///
/// Eras centred before 1980 penalize it, eras centred from 2005 on reward it,
/// and the years in between are neutral. No-op without an era window.
pub fn era_adjust(raw: f64, stat: &SeasonStat, era: Option<EraWindow>) -> f64 {
    let Some(window) = era else {
        return raw;
    };
    let reliance = unit(stat.three_rate, HEAVY_THREE_RATE);
    let midpoint = window.midpoint();
    let delta = if midpoint < PRE_THREE_POINT_ERA {
        -ERA_ADJUST_MAX * reliance
    } else if midpoint >= THREE_POINT_ERA {
        ERA_ADJUST_MAX * reliance
    } else {
        0.0
    };
    raw + delta
}

/// Reward an unfilled position, penalize stacking a third player at one.
fn redundancy_term(position: Option<Position>, teammates: &[Teammate]) -> f64 {
    let Some(position) = position else {
        return 0.0;
    };
    let same = teammates.iter().filter(|t| t.position == Some(position)).count();
    let term = match same {
        0 => REDUNDANCY_MAX,
        1 => 0.0,
        n => -2.0 * (n as f64 - 1.0),
    };
    term.clamp(-REDUNDANCY_MAX, REDUNDANCY_MAX)
}

/// Bigs gain for standing over the roster average, guards for staying near it.
fn height_term(position: Option<Position>, fit: &TeamFit<'_>) -> f64 {
    let (Some(position), Some(height)) = (position, fit.candidate_height) else {
        return 0.0;
    };
    let heights: Vec<f64> = fit
        .teammates
        .iter()
        .filter_map(|t| t.height_inches.map(f64::from))
        .collect();
    if heights.is_empty() {
        return 0.0;
    }
    let average = heights.iter().sum::<f64>() / heights.len() as f64;
    let diff = f64::from(height) - average;
    let term = if position.is_big() {
        diff / 2.0
    } else if position.is_guard() {
        1.5 - diff.abs() * 0.5
    } else {
        0.0
    };
    term.clamp(-HEIGHT_FIT_MAX, HEIGHT_FIT_MAX)
}

/// Star-heavy rosters reward low-usage complements; role-heavy rosters
/// reward a high-usage creator.
fn usage_term(candidate_usage: f64, teammates: &[Teammate]) -> f64 {
    if teammates.is_empty() {
        return 0.0;
    }
    let average = teammates.iter().map(|t| t.usage_rate).sum::<f64>() / teammates.len() as f64;
    let term = if average > STAR_HEAVY_USAGE {
        (STAR_HEAVY_USAGE - candidate_usage) / 3.0
    } else if average < ROLE_HEAVY_USAGE {
        (candidate_usage - ROLE_HEAVY_USAGE) / 3.0
    } else {
        0.0
    };
    term.clamp(-USAGE_FIT_MAX, USAGE_FIT_MAX)
}

/// Fit with the existing roster on -10..=10.
pub fn compatibility(stat: &SeasonStat, position: Option<Position>, fit: &TeamFit<'_>) -> f64 {
    let total = redundancy_term(position, fit.teammates)
        + height_term(position, fit)
        + usage_term(stat.usage_rate, fit.teammates);
    total.clamp(-COMPATIBILITY_MAX, COMPATIBILITY_MAX)
}

/// Rating of the season on its own: base + advanced, era adjusted, with
/// no team fit. Used for the overall cap.
pub fn standalone(stat: &SeasonStat, position: Position, era: Option<EraWindow>) -> f64 {
    era_adjust(base(stat, position) + advanced(stat), stat, era).clamp(0.0, 100.0)
}

/// The full pick score on 0..=100.
///
/// `slot_position` is the position the slot requires; open slots score the
/// player at `natural_position` (their primary position).
pub fn score(
    stat: &SeasonStat,
    slot_position: Option<Position>,
    natural_position: Position,
    era: Option<EraWindow>,
    fit: &TeamFit<'_>,
) -> f64 {
    let position = slot_position.unwrap_or(natural_position);
    let raw = era_adjust(base(stat, position) + advanced(stat), stat, era);
    (raw + compatibility(stat, Some(position), fit)).clamp(0.0, 100.0)
}

/// Round to one decimal place for reporting.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elite_line() -> SeasonStat {
        SeasonStat {
            season: Some(1988),
            franchise: Some("CHI".into()),
            games: 82.0,
            points: 35.0,
            assists: 11.0,
            rebounds: 14.0,
            steals: 3.0,
            blocks: 2.0,
            fg_pct: 0.54,
            ts_pct: 0.66,
            three_rate: 0.05,
            usage_rate: 38.0,
            per: 31.7,
            bpm: 13.0,
            ws_per_48: 0.308,
        }
    }

    fn modest_line() -> SeasonStat {
        SeasonStat {
            points: 12.0,
            assists: 3.0,
            rebounds: 4.0,
            steals: 1.0,
            blocks: 0.2,
            ts_pct: 0.55,
            three_rate: 0.45,
            usage_rate: 18.0,
            per: 14.0,
            bpm: 0.5,
            ws_per_48: 0.100,
            ..SeasonStat::default()
        }
    }

    fn mate(position: Position, height: u16, usage: f64) -> Teammate {
        Teammate {
            position: Some(position),
            height_inches: Some(height),
            usage_rate: usage,
        }
    }

    #[test]
    fn weights_sum_to_fifty_for_every_position() {
        for pos in Position::ALL {
            assert!((BaseWeights::for_position(pos).total() - 50.0).abs() < 1e-9, "{pos}");
        }
    }

    #[test]
    fn base_is_capped_at_fifty() {
        assert!((base(&elite_line(), Position::ShootingGuard) - 50.0).abs() < 1e-9);
        assert!((base(&SeasonStat::default(), Position::Center)).abs() < 1e-9);
    }

    #[test]
    fn position_shifts_base_weighting() {
        let passer = SeasonStat {
            assists: 10.0,
            ..SeasonStat::default()
        };
        assert!(base(&passer, Position::PointGuard) > base(&passer, Position::Center));
        let rebounder = SeasonStat {
            rebounds: 13.0,
            ..SeasonStat::default()
        };
        assert!(base(&rebounder, Position::Center) > base(&rebounder, Position::PointGuard));
    }

    #[test]
    fn usage_multiplier_is_clamped() {
        assert!((usage_multiplier(5.0) - 0.5).abs() < 1e-9);
        assert!((usage_multiplier(20.0) - 1.0).abs() < 1e-9);
        assert!((usage_multiplier(40.0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn advanced_stays_within_bounds() {
        assert!((advanced(&elite_line()) - 50.0).abs() < 1e-9);
        let a = advanced(&modest_line());
        assert!(a > 0.0 && a < 50.0, "advanced was {a}");
    }

    #[test]
    fn era_adjust_direction_depends_on_midpoint() {
        let shooter = modest_line();
        assert!(era_adjust(40.0, &shooter, Some(EraWindow::new(1960, 1975))) < 40.0);
        assert!(era_adjust(40.0, &shooter, Some(EraWindow::new(2010, 2020))) > 40.0);
        assert!((era_adjust(40.0, &shooter, Some(EraWindow::new(1985, 1995))) - 40.0).abs() < 1e-9);
        assert!((era_adjust(40.0, &shooter, None) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn era_adjust_never_exceeds_ten_points() {
        let bomber = SeasonStat {
            three_rate: 0.9,
            ..SeasonStat::default()
        };
        let adjusted = era_adjust(50.0, &bomber, Some(EraWindow::new(2015, 2024)));
        assert!((adjusted - 60.0).abs() < 1e-9);
    }

    #[test]
    fn empty_position_is_rewarded_and_stacking_penalized() {
        let line = modest_line();
        let empty = compatibility(&line, Some(Position::Center), &TeamFit::empty(None));
        assert!((empty - REDUNDANCY_MAX).abs() < 1e-9);

        let roster = [mate(Position::PointGuard, 74, 20.0)];
        let fresh = TeamFit {
            candidate_height: None,
            teammates: &roster,
        };
        assert!(compatibility(&line, Some(Position::Center), &fresh) > 0.0);

        let stacked = [
            mate(Position::Center, 84, 20.0),
            mate(Position::Center, 83, 20.0),
        ];
        let crowded = TeamFit {
            candidate_height: None,
            teammates: &stacked,
        };
        assert!(compatibility(&line, Some(Position::Center), &crowded) < 0.0);
    }

    #[test]
    fn bigs_rewarded_for_height_over_roster_average() {
        let roster = [mate(Position::PointGuard, 74, 20.0), mate(Position::SmallForward, 80, 20.0)];
        let tall = TeamFit {
            candidate_height: Some(85),
            teammates: &roster,
        };
        let short = TeamFit {
            candidate_height: Some(76),
            teammates: &roster,
        };
        assert!(height_term(Some(Position::Center), &tall) > height_term(Some(Position::Center), &short));
        assert!((height_term(Some(Position::Center), &tall) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn star_heavy_roster_rewards_low_usage() {
        let stars = [mate(Position::PointGuard, 74, 32.0), mate(Position::SmallForward, 80, 30.0)];
        assert!(usage_term(15.0, &stars) > 0.0);
        assert!(usage_term(35.0, &stars) < 0.0);

        let role_players = [mate(Position::PointGuard, 74, 14.0)];
        assert!(usage_term(30.0, &role_players) > 0.0);
    }

    #[test]
    fn compatibility_is_clamped() {
        let stacked = [
            mate(Position::Center, 70, 40.0),
            mate(Position::Center, 70, 40.0),
            mate(Position::Center, 70, 40.0),
            mate(Position::Center, 70, 40.0),
        ];
        let fit = TeamFit {
            candidate_height: Some(70),
            teammates: &stacked,
        };
        let mut line = modest_line();
        line.usage_rate = 40.0;
        let c = compatibility(&line, Some(Position::Center), &fit);
        assert!(c >= -10.0 && c <= 10.0);
    }

    #[test]
    fn score_is_bounded_and_deterministic() {
        let line = elite_line();
        let fit = TeamFit::empty(Some(78));
        let first = score(&line, None, Position::ShootingGuard, Some(EraWindow::new(1980, 1989)), &fit);
        let second = score(&line, None, Position::ShootingGuard, Some(EraWindow::new(1980, 1989)), &fit);
        assert!(first <= 100.0 && first >= 0.0);
        assert_eq!(first.to_bits(), second.to_bits());
        assert!((first - 100.0).abs() < 1e-9);
    }

    #[test]
    fn standalone_ignores_team_fit() {
        let line = modest_line();
        let s = standalone(&line, Position::SmallForward, None);
        assert!((s - (base(&line, Position::SmallForward) + advanced(&line))).abs() < 1e-9);
    }

    #[test]
    fn round1_keeps_one_decimal() {
        assert!((round1(12.345) - 12.3).abs() < 1e-9);
        assert!((round1(-3.26) + 3.3).abs() < 1e-9);
    }
}
