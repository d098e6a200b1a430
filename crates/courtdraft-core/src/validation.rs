// Rule validation: roster-wide constraints checked before a pick commits,
// and the non-blocking warnings attached to a score report.

use thiserror::Error;

use crate::player::Player;
use crate::rules::{HallRule, RuleSet};

/// A rule broken by a pick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleViolation {
    #[error("points-per-game cap exceeded: {total:.1} > {cap:.1}")]
    PpgCapExceeded { total: f64, cap: f64 },

    #[error("overall rating cap exceeded: {total:.1} > {cap:.1}")]
    OverallCapExceeded { total: f64, cap: f64 },

    #[error("{player} played for only one franchise")]
    SingleFranchise { player: String },

    #[error("{player} never shared a season on a franchise with {teammate}")]
    NoSharedTenure { player: String, teammate: String },

    #[error("{player} violates hall-of-fame rule `{rule:?}`")]
    HallOfFame { player: String, rule: HallRule },
}

impl RuleViolation {
    /// Whether this is a cap violation (reported with its total).
    pub fn is_cap(&self) -> bool {
        matches!(
            self,
            RuleViolation::PpgCapExceeded { .. } | RuleViolation::OverallCapExceeded { .. }
        )
    }
}

/// One pick as the validator sees it.
#[derive(Debug, Clone, Copy)]
pub struct RosterLine<'a> {
    pub player: &'a Player,
    /// Points per game of the season used for this pick.
    pub points: f64,
    /// Standalone rating of the season used for this pick.
    pub rating: f64,
}

/// Per-player eligibility: multi-franchise and co-tenure requirements.
///
/// `played_with` is the resolved co-tenure anchor when the rule set names
/// one. The anchor is always eligible alongside themselves.
pub fn check_eligibility(
    rules: &RuleSet,
    player: &Player,
    played_with: Option<&Player>,
) -> Result<(), RuleViolation> {
    if rules.multi_team_only && !player.played_for_multiple_franchises() {
        return Err(RuleViolation::SingleFranchise {
            player: player.name.clone(),
        });
    }

    if let Some(anchor) = played_with {
        if anchor.id != player.id && !player.shared_tenure_with(anchor) {
            return Err(RuleViolation::NoSharedTenure {
                player: player.name.clone(),
                teammate: anchor.name.clone(),
            });
        }
    }

    Ok(())
}

/// Everything checked at commit time for `candidate` joining `seat`.
///
/// The PPG cap blocks only when the rule set enforces it.
pub fn check_commit(
    rules: &RuleSet,
    seat: &[RosterLine<'_>],
    candidate: &RosterLine<'_>,
    played_with: Option<&Player>,
) -> Result<(), RuleViolation> {
    check_eligibility(rules, candidate.player, played_with)?;

    if rules.enforce_ppg_cap {
        if let Some(cap) = rules.max_ppg_cap {
            let total = seat_points(seat) + candidate.points;
            if exceeds(total, cap) {
                return Err(RuleViolation::PpgCapExceeded { total, cap });
            }
        }
    }

    if let Some(cap) = rules.overall_cap {
        let total = seat.iter().map(|l| l.rating).sum::<f64>() + candidate.rating;
        if exceeds(total, cap) {
            return Err(RuleViolation::OverallCapExceeded { total, cap });
        }
    }

    Ok(())
}

/// Non-blocking warnings for one seat's finished (or partial) roster.
pub fn roster_warnings(rules: &RuleSet, seat: &[RosterLine<'_>]) -> Vec<RuleViolation> {
    let mut warnings: Vec<RuleViolation> = seat
        .iter()
        .filter(|line| !rules.hall_rule.admits(line.player.hall_of_fame))
        .map(|line| RuleViolation::HallOfFame {
            player: line.player.name.clone(),
            rule: rules.hall_rule,
        })
        .collect();

    if !rules.enforce_ppg_cap {
        if let Some(cap) = rules.max_ppg_cap {
            let total = seat_points(seat);
            if exceeds(total, cap) {
                warnings.push(RuleViolation::PpgCapExceeded { total, cap });
            }
        }
    }

    warnings
}

fn seat_points(seat: &[RosterLine<'_>]) -> f64 {
    seat.iter().map(|l| l.points).sum()
}

/// Cap comparison tolerant of float noise in summed per-game values.
fn exceeds(total: f64, cap: f64) -> bool {
    total - cap > 1e-9
}
