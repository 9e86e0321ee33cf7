//! TickerCache - Market Data Aggregation Backend
//!
//! Caches daily OHLCV bars, quote snapshots, and news headlines from upstream
//! market-data providers in SQLite, reconciling coverage gaps on demand so
//! each calendar day is fetched at most once.

pub mod config;
pub mod db;
pub mod error;
pub mod providers;
pub mod services;
pub mod state;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for embedding binaries
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tickercache=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
