// Season catalog: the read-only player/season collection the engine drafts from.
//
// The in-memory implementation loads two CSV files produced by the offline
// catalog pipeline: one row per player and one row per (player, season, team).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use courtdraft_core::player::{Player, PlayerId, Position, SeasonStat};
use courtdraft_core::rules::{EraWindow, HallRule};

use crate::error::CatalogError;

/// Search criteria shared by interactive search and the auto-pick pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerFilter {
    /// Case-insensitive substring of the player's name.
    pub text: Option<String>,
    pub position: Option<Position>,
    /// At least one season inside this window.
    pub era: Option<EraWindow>,
    /// At least one season on this franchise (normalized).
    pub franchise: Option<String>,
    pub hall_rule: HallRule,
    pub multi_franchise_only: bool,
    /// Players to leave out, typically those already drafted.
    pub exclude: Vec<PlayerId>,
    pub limit: usize,
    pub offset: usize,
}

impl PlayerFilter {
    pub fn matches(&self, player: &Player) -> bool {
        if self.exclude.contains(&player.id) {
            return false;
        }
        if let Some(text) = &self.text {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty() && !player.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if let Some(position) = self.position {
            if !player.is_eligible_at(position) {
                return false;
            }
        }
        if let Some(era) = self.era {
            let in_era = player
                .seasons
                .iter()
                .any(|s| s.season.is_some_and(|year| era.contains(year)));
            if !in_era {
                return false;
            }
        }
        if let Some(code) = &self.franchise {
            if !player.seasons.iter().any(|s| s.is_on_franchise(code)) {
                return false;
            }
        }
        if !self.hall_rule.admits(player.hall_of_fame) {
            return false;
        }
        if self.multi_franchise_only && !player.played_for_multiple_franchises() {
            return false;
        }
        true
    }
}

#[async_trait]
pub trait SeasonCatalog: Send + Sync {
    async fn find_player(&self, id: PlayerId) -> Result<Option<Player>, CatalogError>;

    /// Matching players ordered by id, paged by `offset`/`limit`.
    async fn search_players(&self, filter: &PlayerFilter) -> Result<Vec<Player>, CatalogError>;
}

/// A fully loaded catalog held in memory. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    players: BTreeMap<PlayerId, Player>,
}

impl InMemoryCatalog {
    pub fn from_players(players: impl IntoIterator<Item = Player>) -> Self {
        let players = players
            .into_iter()
            .map(|mut p| {
                p.seasons.sort_by_key(|s| s.season);
                (p.id, p)
            })
            .collect();
        InMemoryCatalog { players }
    }

    /// Load `players.csv` and `seasons.csv`.
    pub fn load_csv(players_path: &Path, seasons_path: &Path) -> Result<Self, CatalogError> {
        let players = open(players_path)?;
        let seasons = open(seasons_path)?;
        let csv_err = |path: &Path| {
            let path = path.display().to_string();
            move |source| CatalogError::Csv { path, source }
        };
        let players = load_players_from_reader(players).map_err(csv_err(players_path))?;
        let seasons = load_seasons_from_reader(seasons).map_err(csv_err(seasons_path))?;
        let catalog = Self::assemble(players, seasons)?;
        info!("Loaded season catalog with {} players", catalog.len());
        Ok(catalog)
    }

    /// Attach season rows to their players.
    fn assemble(
        players: Vec<Player>,
        seasons: Vec<(PlayerId, SeasonStat)>,
    ) -> Result<Self, CatalogError> {
        if players.is_empty() {
            return Err(CatalogError::Validation("player CSV produced zero valid rows".into()));
        }
        let mut by_id: BTreeMap<PlayerId, Player> = players.into_iter().map(|p| (p.id, p)).collect();
        for (player_id, season) in seasons {
            match by_id.get_mut(&player_id) {
                Some(player) => player.seasons.push(season),
                None => warn!("skipping season row for unknown player {player_id}"),
            }
        }
        Ok(Self::from_players(by_id.into_values()))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[async_trait]
impl SeasonCatalog for InMemoryCatalog {
    async fn find_player(&self, id: PlayerId) -> Result<Option<Player>, CatalogError> {
        Ok(self.players.get(&id).cloned())
    }

    async fn search_players(&self, filter: &PlayerFilter) -> Result<Vec<Player>, CatalogError> {
        Ok(self
            .players
            .values()
            .filter(|p| filter.matches(p))
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// CSV rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: PlayerId,
    name: String,
    /// `|`-separated, e.g. `PG|SG`.
    positions: String,
    #[serde(default)]
    height_in: Option<u16>,
    #[serde(default)]
    hall_of_fame: String,
    /// `|`-separated franchise codes.
    #[serde(default)]
    franchises: String,
}

#[derive(Debug, Deserialize)]
struct RawSeason {
    player_id: PlayerId,
    season: i32,
    team: String,
    #[serde(default)]
    games: f64,
    ppg: f64,
    #[serde(default)]
    apg: f64,
    #[serde(default)]
    rpg: f64,
    #[serde(default)]
    spg: f64,
    #[serde(default)]
    bpg: f64,
    #[serde(default)]
    fg_pct: f64,
    #[serde(default)]
    ts_pct: f64,
    #[serde(default)]
    three_rate: f64,
    #[serde(default)]
    usage_rate: f64,
    #[serde(default)]
    per: f64,
    #[serde(default)]
    bpm: f64,
    #[serde(default)]
    ws48: f64,
}

fn open(path: &Path) -> Result<std::fs::File, CatalogError> {
    std::fs::File::open(path).map_err(|e| CatalogError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('|').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "y")
}

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    for result in reader.deserialize::<RawPlayer>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };
        let mut positions = Vec::new();
        for code in split_list(&raw.positions) {
            match Position::from_str_pos(code) {
                Some(pos) if !positions.contains(&pos) => positions.push(pos),
                Some(_) => {}
                None => warn!("player '{}': unknown position '{}'", raw.name.trim(), code),
            }
        }
        if positions.is_empty() {
            warn!("skipping player '{}': no known positions", raw.name.trim());
            continue;
        }
        players.push(Player {
            id: raw.id,
            name: raw.name.trim().to_string(),
            positions,
            height_inches: raw.height_in,
            hall_of_fame: parse_flag(&raw.hall_of_fame),
            franchises: split_list(&raw.franchises).map(str::to_string).collect(),
            seasons: Vec::new(),
        });
    }
    Ok(players)
}

fn load_seasons_from_reader<R: Read>(rdr: R) -> Result<Vec<(PlayerId, SeasonStat)>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut seasons = Vec::new();
    for result in reader.deserialize::<RawSeason>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed season row: {}", e);
                continue;
            }
        };
        if !raw.ppg.is_finite() {
            warn!("skipping season {} of player {}: non-finite ppg", raw.season, raw.player_id);
            continue;
        }
        let team = raw.team.trim();
        seasons.push((
            raw.player_id,
            SeasonStat {
                season: Some(raw.season),
                franchise: (!team.is_empty()).then(|| team.to_ascii_uppercase()),
                games: raw.games,
                points: raw.ppg,
                assists: raw.apg,
                rebounds: raw.rpg,
                steals: raw.spg,
                blocks: raw.bpg,
                fg_pct: raw.fg_pct,
                ts_pct: raw.ts_pct,
                three_rate: raw.three_rate,
                usage_rate: raw.usage_rate,
                per: raw.per,
                bpm: raw.bpm,
                ws_per_48: raw.ws48,
            },
        ));
    }
    Ok(seasons)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYERS: &str = "\
id,name,positions,height_in,hall_of_fame,franchises
1,Magic Johnson,PG|SF,81,true,LAL
2,Dale Ellis,SG,79,false,DAL|SEA|MIL
3,Mystery Man,G,75,false,BOS
4,Shawn Kemp,PF|XX,82,0,SEA|CLE
";

    const SEASONS: &str = "\
player_id,season,team,games,ppg,apg,rpg,spg,bpg,fg_pct,ts_pct,three_rate,usage_rate,per,bpm,ws48
1,1987,LAL,80,23.9,12.2,6.3,1.7,0.5,0.522,0.602,0.02,26.3,27.0,8.4,0.263
1,1990,LAL,79,22.3,11.5,6.6,1.7,0.4,0.480,0.622,0.14,26.5,26.6,10.1,0.275
2,1989,SEA,82,27.5,2.0,4.2,1.3,0.3,0.501,0.600,0.30,27.0,21.3,3.2,0.170
2,1985,DAL,72,9.3,1.0,2.1,0.5,0.1,0.456,0.520,0.20,18.0,13.0,-1.0,0.080
4,1996,SEA,79,19.6,2.2,11.4,1.2,0.8,0.561,0.633,0.00,24.5,23.0,4.7,0.200
9,2001,BOS,10,1.0,0,0,0,0,0.3,0.4,0,10,5,-5,0
";

    fn catalog() -> InMemoryCatalog {
        let players = load_players_from_reader(PLAYERS.as_bytes()).unwrap();
        let seasons = load_seasons_from_reader(SEASONS.as_bytes()).unwrap();
        InMemoryCatalog::assemble(players, seasons).unwrap()
    }

    fn filter() -> PlayerFilter {
        PlayerFilter {
            limit: 50,
            ..PlayerFilter::default()
        }
    }

    #[test]
    fn csv_rows_become_players_with_seasons() {
        let cat = catalog();
        // Mystery Man has no known position.
        assert_eq!(cat.len(), 3);
        let magic = &cat.players[&1];
        assert_eq!(magic.positions, vec![Position::PointGuard, Position::SmallForward]);
        assert!(magic.hall_of_fame);
        assert_eq!(magic.seasons.len(), 2);
        let kemp = &cat.players[&4];
        assert_eq!(kemp.positions, vec![Position::PowerForward]);
        assert!(!kemp.hall_of_fame);
    }

    #[test]
    fn seasons_are_sorted_by_year() {
        let cat = catalog();
        let years: Vec<_> = cat.players[&2].seasons.iter().map(|s| s.season).collect();
        assert_eq!(years, vec![Some(1985), Some(1989)]);
    }

    #[tokio::test]
    async fn search_by_text_position_and_hall() {
        let cat = catalog();
        let by_text = cat
            .search_players(&PlayerFilter {
                text: Some("MAGIC".into()),
                ..filter()
            })
            .await
            .unwrap();
        assert_eq!(by_text.len(), 1);

        let forwards = cat
            .search_players(&PlayerFilter {
                position: Some(Position::SmallForward),
                ..filter()
            })
            .await
            .unwrap();
        assert_eq!(forwards.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);

        let non_hof = cat
            .search_players(&PlayerFilter {
                hall_rule: HallRule::None,
                ..filter()
            })
            .await
            .unwrap();
        assert_eq!(non_hof.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 4]);
    }

    #[tokio::test]
    async fn search_by_era_uses_prior_year_and_normalized_franchise() {
        let cat = catalog();
        let nineties = cat
            .search_players(&PlayerFilter {
                era: Some(EraWindow::new(1991, 1999)),
                ..filter()
            })
            .await
            .unwrap();
        // Magic's 1990 season counts for a 1991 window.
        assert_eq!(nineties.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 4]);

        let thunder = cat
            .search_players(&PlayerFilter {
                franchise: Some("OKC".into()),
                ..filter()
            })
            .await
            .unwrap();
        assert_eq!(thunder.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 4]);
    }

    #[tokio::test]
    async fn search_pages_and_excludes() {
        let cat = catalog();
        let page = cat
            .search_players(&PlayerFilter {
                offset: 1,
                limit: 1,
                ..filter()
            })
            .await
            .unwrap();
        assert_eq!(page.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2]);

        let rest = cat
            .search_players(&PlayerFilter {
                exclude: vec![1, 2],
                ..filter()
            })
            .await
            .unwrap();
        assert_eq!(rest.iter().map(|p| p.id).collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn empty_player_file_is_rejected() {
        let header_only = "id,name,positions,height_in,hall_of_fame,franchises\n";
        let players = load_players_from_reader(header_only.as_bytes()).unwrap();
        assert!(matches!(
            InMemoryCatalog::assemble(players, vec![]),
            Err(CatalogError::Validation(_))
        ));
    }
}
