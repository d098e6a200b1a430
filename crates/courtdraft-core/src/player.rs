// Catalog entities: players, positions, and per-season stat lines.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::franchise;

/// Catalog player identifier.
pub type PlayerId = i64;

/// Basketball positions used for roster slot assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "PG")]
    PointGuard,
    #[serde(rename = "SG")]
    ShootingGuard,
    #[serde(rename = "SF")]
    SmallForward,
    #[serde(rename = "PF")]
    PowerForward,
    #[serde(rename = "C")]
    Center,
}

impl Position {
    /// All positions in roster display order.
    pub const ALL: [Position; 5] = [
        Position::PointGuard,
        Position::ShootingGuard,
        Position::SmallForward,
        Position::PowerForward,
        Position::Center,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Accepts the usual abbreviations as well as the long names
    /// ("point guard", "center"/"centre").
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PG" | "POINT GUARD" => Some(Position::PointGuard),
            "SG" | "SHOOTING GUARD" => Some(Position::ShootingGuard),
            "SF" | "SMALL FORWARD" => Some(Position::SmallForward),
            "PF" | "POWER FORWARD" => Some(Position::PowerForward),
            "C" | "CENTER" | "CENTRE" => Some(Position::Center),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::SmallForward => "SF",
            Position::PowerForward => "PF",
            Position::Center => "C",
        }
    }

    pub fn is_guard(&self) -> bool {
        matches!(self, Position::PointGuard | Position::ShootingGuard)
    }

    pub fn is_big(&self) -> bool {
        matches!(self, Position::PowerForward | Position::Center)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// One season's per-game and advanced numbers for a player on one franchise.
///
/// `season` and `franchise` are `None` only on a synthesized career/window
/// average, which has no single year or team.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeasonStat {
    /// Season year, attributed to the calendar year the season ends in.
    pub season: Option<i32>,
    /// Team code as stored by the catalog (may be historical).
    pub franchise: Option<String>,
    pub games: f64,
    pub points: f64,
    pub assists: f64,
    pub rebounds: f64,
    pub steals: f64,
    pub blocks: f64,
    pub fg_pct: f64,
    pub ts_pct: f64,
    /// Share of field-goal attempts taken from three, 0.0..=1.0.
    pub three_rate: f64,
    /// Usage rate in percent (league average is roughly 20).
    pub usage_rate: f64,
    pub per: f64,
    pub bpm: f64,
    pub ws_per_48: f64,
}

impl SeasonStat {
    /// Whether this line belongs to the given franchise after normalization.
    pub fn is_on_franchise(&self, code: &str) -> bool {
        self.franchise
            .as_deref()
            .is_some_and(|own| franchise::same_franchise(own, code))
    }

    /// The franchise this line was played for, normalized.
    pub fn canonical_franchise(&self) -> Option<String> {
        self.franchise.as_deref().map(franchise::normalize)
    }
}

/// An immutable catalog player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Eligible positions; the first entry is the primary position.
    pub positions: Vec<Position>,
    pub height_inches: Option<u16>,
    pub hall_of_fame: bool,
    /// Franchise codes the player appeared for, as listed by the catalog.
    #[serde(default)]
    pub franchises: Vec<String>,
    /// Season lines ordered by year.
    #[serde(default)]
    pub seasons: Vec<SeasonStat>,
}

impl Player {
    pub fn primary_position(&self) -> Option<Position> {
        self.positions.first().copied()
    }

    pub fn is_eligible_at(&self, position: Position) -> bool {
        self.positions.contains(&position)
    }

    /// Every canonical franchise the player appeared for, taken from both
    /// the listed franchises and the season lines.
    pub fn canonical_franchises(&self) -> BTreeSet<String> {
        self.franchises
            .iter()
            .map(|code| franchise::normalize(code))
            .chain(self.seasons.iter().filter_map(SeasonStat::canonical_franchise))
            .collect()
    }

    pub fn played_for_multiple_franchises(&self) -> bool {
        self.canonical_franchises().len() > 1
    }

    pub fn played_for(&self, code: &str) -> bool {
        self.canonical_franchises().contains(&franchise::normalize(code))
    }

    /// Canonical (franchise, season) pairs, used for co-tenure checks.
    pub fn tenures(&self) -> BTreeSet<(String, i32)> {
        self.seasons
            .iter()
            .filter_map(|s| Some((s.canonical_franchise()?, s.season?)))
            .collect()
    }

    /// Whether the two players share at least one (franchise, season).
    pub fn shared_tenure_with(&self, other: &Player) -> bool {
        let mine = self.tenures();
        other.tenures().iter().any(|t| mine.contains(t))
    }
}
