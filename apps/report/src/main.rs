//! # Hotelier Report
//!
//! Loads one hotel through the change feed and prints its dashboard:
//! occupancy, open folios, stock alerts and the service queue.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter                                │
//! │     • Default: INFO, can be overridden with RUST_LOG                    │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • --config path, else the platform config dir                       │
//! │     • HOTELIER_* environment overrides                                  │
//! │                                                                         │
//! │  3. Connect to Database ──────────────────────────────────────────────► │
//! │     • SQLite with WAL mode, pending migrations applied                  │
//! │                                                                         │
//! │  4. Hydrate Store ────────────────────────────────────────────────────► │
//! │     • DatabaseSource publishes one snapshot per collection              │
//! │     • HotelStore follows the feed while the source publishes            │
//! │                                                                         │
//! │  5. Print Report ─────────────────────────────────────────────────────► │
//! │     • Sections whose data is unavailable print a degraded notice        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! cargo run -p hotelier-report -- --config ./hotelier.toml --window next7
//! ```

mod render;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hotelier_core::{Clock, OccupancyWindow, SystemClock};
use hotelier_db::Database;
use hotelier_sync::{BroadcastFeed, ChangeFeed, DatabaseSource, HotelStore, HotelierConfig, SyncError};

/// Parsed command line.
struct Args {
    config: Option<PathBuf>,
    window: OccupancyWindow,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match parse_args(env::args().skip(1).collect())? {
        Some(args) => args,
        None => return Ok(()),
    };

    init_tracing();

    let config = HotelierConfig::load(args.config)?;
    info!(hotel_id = %config.hotel_id(), db = ?config.database.path, "Configuration loaded");

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(config.db_config())
        .await
        .map_err(SyncError::from)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let feed = BroadcastFeed::new(config.feed.channel_capacity);
    let store = HotelStore::new(config.hotel_id(), clock)
        .with_fallback_settings(config.billing_settings())
        .with_policy(config.inventory.negative_stock_policy);
    let subscription = feed.subscribe(config.hotel_id());

    let source = DatabaseSource::new(db.clone(), config.hotel_id());
    if let Err(e) = source.hydrate(feed, subscription, &store).await {
        if !e.is_unavailable() {
            return Err(e.into());
        }
        warn!(error = %e, "Database unavailable, report will be degraded");
    }

    render::print_report(&config.hotel.name, &store, args.window).await;

    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG=debug` shows store and feed activity; default is INFO.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hotelier=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Returns `None` when help was printed.
fn parse_args(args: Vec<String>) -> Result<Option<Args>, String> {
    let mut config = None;
    let mut window = OccupancyWindow::Last7Days;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let path = args.get(i + 1).ok_or("--config needs a path")?;
                config = Some(PathBuf::from(path));
                i += 1;
            }
            "--window" | "-w" => {
                let value = args.get(i + 1).ok_or("--window needs a value")?;
                window = parse_window(value)?;
                i += 1;
            }
            "--help" | "-h" => {
                println!("Hotelier Report");
                println!();
                println!("Usage: hotelier-report [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>    Config file (default: platform config dir)");
                println!("  -w, --window <WINDOW>  last7 | last30 | next7 (default: last7)");
                println!("  -h, --help             Show this help message");
                return Ok(None);
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
        i += 1;
    }

    Ok(Some(Args { config, window }))
}

fn parse_window(value: &str) -> Result<OccupancyWindow, String> {
    match value {
        "last7" => Ok(OccupancyWindow::Last7Days),
        "last30" => Ok(OccupancyWindow::Last30Days),
        "next7" => Ok(OccupancyWindow::Next7Days),
        other => Err(format!("Unknown window '{}', expected last7, last30 or next7", other)),
    }
}
