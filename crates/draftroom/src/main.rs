// draftroom service entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config
// 3. Open database
// 4. Import the player pool, if configured
// 5. Start the draft clock
// 6. Log draft events until Ctrl+C
// 7. Stop the clock and exit

use std::path::Path;
use std::sync::Arc;

use draftroom::config;
use draftroom::db::Database;
use draftroom::draft::clock::{ClockSettings, DraftClock};
use draftroom::draft::executor::DraftRoom;
use draftroom::events::EventBus;
use draftroom::players;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("draftroom starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: clock every {}ms, stagger {}ms, chain limit {}",
        config.clock.poll_interval_ms,
        config.clock.auto_pick_stagger_ms,
        config.clock.max_chained_picks
    );

    // 3. Open database
    let db = Arc::new(Database::open(&config.database.path).context("failed to open database")?);
    info!("Database opened at {}", config.database.path);

    // 4. Import the player pool
    if let Some(pool_path) = &config.players.pool_csv {
        let pool = players::load_players(Path::new(pool_path))
            .with_context(|| format!("failed to load player pool from {pool_path}"))?;
        let rankings = match &config.players.adp_csv {
            Some(adp_path) => players::load_adp(Path::new(adp_path))
                .with_context(|| format!("failed to load ADP from {adp_path}"))?,
            None => Vec::new(),
        };
        let (imported, ranked) = db
            .import_pool(&pool, &rankings)
            .context("failed to import player pool")?;
        info!("Imported {} players, {} ADP rankings", imported, ranked);
    }

    // 5. Start the draft clock
    let events = EventBus::default();
    let room = DraftRoom::new(db, events.clone());
    let clock = DraftClock::new(room, ClockSettings::from(&config.clock));
    let handle = clock.start();

    // 6. Log draft events until Ctrl+C
    let mut rx = events.subscribe();
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => info!(league = event.league_id(), "event {}", json),
                    Err(e) => warn!("failed to serialize draft event: {}", e),
                },
                Err(RecvError::Lagged(n)) => warn!("event log lagged, {} events dropped", n),
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("failed to listen for Ctrl+C: {}", e);
                }
                info!("Shutdown requested");
                break;
            }
        }
    }

    // 7. Stop the clock
    handle.stop().await;
    info!("draftroom shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to `logs/draftroom.log`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("draftroom.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("draftroom=info,warn")),
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
