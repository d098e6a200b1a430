// Shared fixtures: an in-memory database, a small catalog, and a sink.

#![allow(dead_code)]

use std::sync::Arc;

use courtdraft_app::catalog::InMemoryCatalog;
use courtdraft_app::config::DraftDefaults;
use courtdraft_app::db::Database;
use courtdraft_app::engine::DraftEngine;
use courtdraft_app::notify::BroadcastSink;
use courtdraft_app::registry::DraftRegistry;
use courtdraft_core::player::{Player, PlayerId, Position, SeasonStat};

pub const COMBO_GUARD: PlayerId = 1;
pub const WING: PlayerId = 2;
pub const POINT_GUARD: PlayerId = 3;
pub const HALL_CENTER: PlayerId = 4;
pub const FORWARD: PlayerId = 5;
pub const SHOOTER: PlayerId = 6;
pub const SYRACUSE_STAR: PlayerId = 7;

pub fn season(year: i32, team: &str, ppg: f64) -> SeasonStat {
    SeasonStat {
        season: Some(year),
        franchise: Some(team.to_string()),
        games: 78.0,
        points: ppg,
        assists: 5.5,
        rebounds: 6.0,
        steals: 1.3,
        blocks: 0.7,
        fg_pct: 0.48,
        ts_pct: 0.57,
        three_rate: 0.18,
        usage_rate: 24.0,
        per: 19.5,
        bpm: 3.5,
        ws_per_48: 0.16,
    }
}

fn player(
    id: PlayerId,
    name: &str,
    positions: &[Position],
    height: u16,
    hall_of_fame: bool,
    seasons: Vec<SeasonStat>,
) -> Player {
    Player {
        id,
        name: name.to_string(),
        positions: positions.to_vec(),
        height_inches: Some(height),
        hall_of_fame,
        franchises: Vec::new(),
        seasons,
    }
}

pub fn players() -> Vec<Player> {
    use Position::*;
    vec![
        player(
            COMBO_GUARD,
            "Combo Guard",
            &[PointGuard, ShootingGuard],
            76,
            false,
            vec![season(1995, "CHI", 25.0), season(1998, "CHI", 22.0)],
        ),
        player(WING, "Wing", &[SmallForward], 79, false, vec![season(1996, "BOS", 20.0)]),
        player(POINT_GUARD, "Floor General", &[PointGuard], 74, false, vec![season(1990, "LAL", 18.0)]),
        player(
            HALL_CENTER,
            "Hall Center",
            &[Center],
            84,
            true,
            vec![season(1985, "BOS", 21.0), season(1988, "HOU", 19.0)],
        ),
        player(FORWARD, "Stretch Four", &[PowerForward], 82, false, vec![season(2000, "SEA", 15.0)]),
        player(SHOOTER, "Shooter", &[ShootingGuard], 77, false, vec![season(2001, "MIA", 12.0)]),
        player(SYRACUSE_STAR, "Nationals Star", &[PowerForward], 80, true, vec![season(1955, "SYR", 23.0)]),
    ]
}

pub struct Harness {
    pub engine: Arc<DraftEngine>,
    pub sink: Arc<BroadcastSink>,
}

pub fn harness() -> Harness {
    harness_with(DraftDefaults::default())
}

pub fn harness_with(defaults: DraftDefaults) -> Harness {
    let sink = Arc::new(BroadcastSink::new(64));
    let engine = DraftEngine::new(
        Arc::new(Database::open(":memory:").expect("in-memory db")),
        Arc::new(InMemoryCatalog::from_players(players())),
        sink.clone(),
        defaults,
    );
    Harness {
        engine: Arc::new(engine),
        sink,
    }
}

pub fn registry() -> (DraftRegistry, Arc<BroadcastSink>) {
    let Harness { engine, sink } = harness();
    (DraftRegistry::new(engine), sink)
}
