// The catalog shipped under data/ must load and support a full draft.

use std::path::PathBuf;
use std::sync::Arc;

use courtdraft_app::catalog::{InMemoryCatalog, SeasonCatalog};
use courtdraft_app::config::DraftDefaults;
use courtdraft_app::db::Database;
use courtdraft_app::draft::{DraftConfig, PickRequest};
use courtdraft_app::engine::DraftEngine;
use courtdraft_app::notify::BroadcastSink;
use courtdraft_core::rules::DraftMode;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

fn load() -> InMemoryCatalog {
    let dir = data_dir();
    InMemoryCatalog::load_csv(&dir.join("players.csv"), &dir.join("seasons.csv")).unwrap()
}

#[test]
fn bundled_csv_loads_every_player() {
    let catalog = load();
    assert_eq!(catalog.len(), 12);
}

#[tokio::test]
async fn bundled_players_have_seasons() {
    let catalog = load();
    let magic = catalog.find_player(1).await.unwrap().unwrap();
    assert_eq!(magic.name, "Magic Johnson");
    assert!(!magic.seasons.is_empty());
}

#[tokio::test]
async fn free_draft_runs_to_completion_on_bundled_data() {
    let engine = DraftEngine::new(
        Arc::new(Database::open(":memory:").unwrap()),
        Arc::new(load()),
        Arc::new(BroadcastSink::new(16)),
        DraftDefaults::default(),
    );
    let draft = engine
        .create_draft(DraftConfig::new("Legends", DraftMode::Free, 2, 2))
        .await
        .unwrap();

    let mut current = draft;
    for player_id in [1, 2, 3, 4] {
        let turn = current.current_turn().unwrap();
        current = engine
            .submit_pick(&current.id, PickRequest::new(turn.slot, player_id), false)
            .await
            .unwrap();
    }
    assert!(current.is_complete());

    let report = engine.score_draft(&current.id).await.unwrap();
    assert_eq!(report.seats.len(), 2);
    assert!(report.seats.iter().all(|s| s.picks.len() == 2 && s.total_ppg > 0.0));
}
