mod analytics;
mod api;
mod config;
mod db;
mod error;
mod state;
mod tables;
mod types;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, CHANNEL_CAPACITY};
use crate::db::{DbWriter, SqliteRecordStore};
use crate::error::Result;
use crate::state::{CacheMetrics, StatisticsCache};
use crate::tables::PermanentPool;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = db::connect(&cfg.db_path).await?;
    info!("Database ready at {}", cfg.db_path);

    // --- Permanent-pool allow-list ---
    let permanent_pool = match &cfg.permanent_pool_path {
        Some(path) => PermanentPool::from_path(path)?,
        None => {
            info!("PERMANENT_POOL_PATH not set; using the embedded allow-list");
            PermanentPool::embedded()?
        }
    };

    // --- Statistics cache over the record store ---
    let health = Arc::new(HealthState::new());
    let metrics = Arc::new(CacheMetrics::new());
    let cache = StatisticsCache::new(
        Arc::new(SqliteRecordStore::new(pool.clone())),
        Arc::new(permanent_pool),
        Arc::clone(&metrics),
    );

    // --- Import writer ---
    let (import_tx, import_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let writer = DbWriter::new(pool.clone(), import_rx, Arc::clone(&cache), Arc::clone(&health));
    tokio::spawn(async move { writer.run().await });

    // --- HTTP API server ---
    let api_state = ApiState { cache, import_tx, health, metrics };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
