// Draft server entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config
// 3. Open database
// 4. Load the season catalog
// 5. Build the engine and registry, restore actors for stored drafts
// 6. Spawn WebSocket server task
// 7. Wait for Ctrl+C, then shut down

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use courtdraft_app::catalog::InMemoryCatalog;
use courtdraft_app::config;
use courtdraft_app::db::Database;
use courtdraft_app::engine::DraftEngine;
use courtdraft_app::notify::BroadcastSink;
use courtdraft_app::registry::DraftRegistry;
use courtdraft_app::ws_server;

/// Events buffered per WebSocket subscriber before it is marked lagging.
const EVENT_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file)
    init_tracing()?;
    info!("Courtdraft starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: ws_port={}, auto-pick page={}",
        config.server.ws_port, config.draft.auto_pick_page_size
    );

    // 3. Open database
    let db = Database::open(&config.database.path).context("failed to open database")?;
    info!("Database opened at {}", config.database.path);

    // 4. Load the season catalog
    let catalog = InMemoryCatalog::load_csv(
        Path::new(&config.catalog.players_csv),
        Path::new(&config.catalog.seasons_csv),
    )
    .context("failed to load season catalog")?;

    // 5. Engine, registry, and actors for drafts that survived a restart
    let sink = Arc::new(BroadcastSink::new(EVENT_BUFFER));
    let engine = DraftEngine::new(
        Arc::new(db),
        Arc::new(catalog),
        sink.clone(),
        config.draft.clone(),
    );
    let registry = Arc::new(DraftRegistry::new(Arc::new(engine)));
    match registry.restore().await {
        Ok(0) => info!("Starting with no stored drafts"),
        Ok(n) => info!("Resumed {n} stored drafts"),
        Err(e) => {
            error!("Failed to restore drafts: {}", e);
            return Err(anyhow::Error::new(e).context("draft restore failed"));
        }
    }

    // 6. Spawn WebSocket server task
    let ws_port = config.server.ws_port;
    let ws_handle = tokio::spawn(async move {
        if let Err(e) = ws_server::run(ws_port, registry, sink).await {
            error!("WebSocket server error on port {}: {}", ws_port, e);
        }
    });
    info!("Courtdraft ready. WebSocket server on 127.0.0.1:{}", ws_port);

    // 7. Wait for Ctrl+C
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("Shutdown requested");

    ws_handle.abort();
    info!("Courtdraft shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to `logs/courtdraft.log`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("courtdraft.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("courtdraft=info,courtdraft_app=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
