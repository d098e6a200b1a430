// Rule set configuration: mode defaults, caller overrides, and the
// pending-turn overlay.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

/// Draft flavour chosen at creation. Each mode supplies rule defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftMode {
    #[default]
    Classic,
    Casual,
    Free,
}

impl DraftMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftMode::Classic => "classic",
            DraftMode::Casual => "casual",
            DraftMode::Free => "free",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(DraftMode::Classic),
            "casual" => Some(DraftMode::Casual),
            "free" => Some(DraftMode::Free),
            _ => None,
        }
    }
}

impl fmt::Display for DraftMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a player's season is chosen for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatMode {
    /// Best season of the whole career.
    #[serde(rename = "peak")]
    Peak,
    /// Mean across the filtered window.
    #[serde(rename = "average", alias = "career-avg")]
    Average,
    /// Best season inside the era window.
    #[serde(rename = "peak-era")]
    PeakEra,
    /// Best season on the franchise constraint.
    #[serde(rename = "peak-team")]
    PeakTeam,
    /// Best season inside the era window on the franchise constraint.
    #[serde(rename = "peak-era-team")]
    PeakEraTeam,
}

impl StatMode {
    pub fn is_peak(&self) -> bool {
        !matches!(self, StatMode::Average)
    }

    /// Whether the draft-level era window participates in season filtering.
    pub fn uses_era(&self) -> bool {
        matches!(self, StatMode::Average | StatMode::PeakEra | StatMode::PeakEraTeam)
    }

    /// Whether the draft-level franchise constraint participates in season filtering.
    pub fn uses_franchise(&self) -> bool {
        matches!(self, StatMode::Average | StatMode::PeakTeam | StatMode::PeakEraTeam)
    }
}

/// Hall-of-fame inclusion policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HallRule {
    #[default]
    Any,
    Only,
    None,
}

impl HallRule {
    /// Whether a player with the given hall-of-fame flag satisfies the policy.
    pub fn admits(&self, hall_of_fame: bool) -> bool {
        match self {
            HallRule::Any => true,
            HallRule::Only => hall_of_fame,
            HallRule::None => !hall_of_fame,
        }
    }
}

/// An inclusive `[from, to]` range of season years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EraWindow {
    pub from: i32,
    pub to: i32,
}

impl EraWindow {
    pub fn new(from: i32, to: i32) -> Self {
        EraWindow { from, to }
    }

    /// Whether a season year falls inside the window.
    ///
    /// The lower bound admits the prior calendar year: a season is stored
    /// under the year it ends in but counts as in-era from the year it starts.
    pub fn contains(&self, season: i32) -> bool {
        season >= self.from - 1 && season <= self.to
    }

    pub fn midpoint(&self) -> f64 {
        (self.from as f64 + self.to as f64) / 2.0
    }
}

/// The frozen rules of one draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Schema version of the persisted rule set.
    #[serde(default = "current_version")]
    pub version: u32,
    pub stat_mode: StatMode,
    pub max_ppg_cap: Option<f64>,
    /// Whether the PPG cap blocks picks at commit time. When false the cap
    /// only produces a score-time warning.
    pub enforce_ppg_cap: bool,
    /// Cap on the sum of a seat's standalone pick ratings.
    pub overall_cap: Option<f64>,
    pub hall_rule: HallRule,
    pub multi_team_only: bool,
    pub played_with_player_id: Option<PlayerId>,
    /// Picks must match the position required by their slot.
    pub position_enforced: bool,
    pub pick_timer_seconds: Option<u32>,
    pub auto_pick_enabled: bool,
}

pub const RULES_VERSION: u32 = 1;

fn current_version() -> u32 {
    RULES_VERSION
}

impl RuleSet {
    /// The defaults a freshly created draft of `mode` starts from.
    pub fn for_mode(mode: DraftMode) -> Self {
        match mode {
            DraftMode::Classic => RuleSet {
                version: RULES_VERSION,
                stat_mode: StatMode::PeakEraTeam,
                max_ppg_cap: None,
                enforce_ppg_cap: false,
                overall_cap: None,
                hall_rule: HallRule::Any,
                multi_team_only: false,
                played_with_player_id: None,
                position_enforced: true,
                pick_timer_seconds: None,
                auto_pick_enabled: false,
            },
            DraftMode::Casual => RuleSet {
                version: RULES_VERSION,
                stat_mode: StatMode::Peak,
                max_ppg_cap: Some(120.0),
                enforce_ppg_cap: true,
                overall_cap: None,
                hall_rule: HallRule::Any,
                multi_team_only: false,
                played_with_player_id: None,
                position_enforced: false,
                pick_timer_seconds: Some(90),
                auto_pick_enabled: true,
            },
            DraftMode::Free => RuleSet {
                version: RULES_VERSION,
                stat_mode: StatMode::Peak,
                max_ppg_cap: None,
                enforce_ppg_cap: false,
                overall_cap: None,
                hall_rule: HallRule::Any,
                multi_team_only: false,
                played_with_player_id: None,
                position_enforced: false,
                pick_timer_seconds: None,
                auto_pick_enabled: false,
            },
        }
    }

    /// Mode defaults with the caller's overrides applied on top.
    pub fn merged(mode: DraftMode, overrides: &RuleOverrides) -> Self {
        let mut rules = RuleSet::for_mode(mode);
        overrides.apply_to(&mut rules);
        rules
    }
}

/// Caller-supplied changes to the mode defaults. Every field is optional;
/// `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOverrides {
    pub stat_mode: Option<StatMode>,
    pub max_ppg_cap: Option<f64>,
    pub enforce_ppg_cap: Option<bool>,
    pub overall_cap: Option<f64>,
    pub hall_rule: Option<HallRule>,
    pub multi_team_only: Option<bool>,
    pub played_with_player_id: Option<PlayerId>,
    pub position_enforced: Option<bool>,
    pub pick_timer_seconds: Option<u32>,
    pub auto_pick_enabled: Option<bool>,
}

impl RuleOverrides {
    fn apply_to(&self, rules: &mut RuleSet) {
        if let Some(mode) = self.stat_mode {
            rules.stat_mode = mode;
        }
        if let Some(cap) = self.max_ppg_cap {
            rules.max_ppg_cap = Some(cap);
        }
        if let Some(enforce) = self.enforce_ppg_cap {
            rules.enforce_ppg_cap = enforce;
        }
        if let Some(cap) = self.overall_cap {
            rules.overall_cap = Some(cap);
        }
        if let Some(hall) = self.hall_rule {
            rules.hall_rule = hall;
        }
        if let Some(multi) = self.multi_team_only {
            rules.multi_team_only = multi;
        }
        if let Some(id) = self.played_with_player_id {
            rules.played_with_player_id = Some(id);
        }
        if let Some(enforced) = self.position_enforced {
            rules.position_enforced = enforced;
        }
        if let Some(secs) = self.pick_timer_seconds {
            rules.pick_timer_seconds = Some(secs);
        }
        if let Some(auto) = self.auto_pick_enabled {
            rules.auto_pick_enabled = auto;
        }
    }
}

/// Context locked in for the current turn only (a spun franchise or era).
///
/// Lives beside the rule set, never inside it, and is replaced by `None`
/// the moment the next pick commits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnOverlay {
    pub franchise: Option<String>,
    pub era: Option<EraWindow>,
}

impl TurnOverlay {
    /// Overlay `other` onto `self`: fields present in `other` win.
    pub fn merge(&mut self, other: TurnOverlay) {
        if other.franchise.is_some() {
            self.franchise = other.franchise;
        }
        if other.era.is_some() {
            self.era = other.era;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.franchise.is_none() && self.era.is_none()
    }
}
