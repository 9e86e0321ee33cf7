//! Application state management

use crate::config::AppConfig;
use crate::db::models::Symbol;
use crate::db::MarketDb;
use crate::providers::finnhub::FinnhubClient;
use crate::providers::gdelt::GdeltClient;
use crate::providers::massive::MassiveClient;
use crate::providers::{BarsProvider, NewsProvider, ProfileProvider, QuoteProvider, RateLimiter};
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;

/// Application state shared across all request handlers
pub struct AppState {
    /// Market data store
    pub db: Arc<MarketDb>,

    /// Daily bar history source
    pub bars: Arc<dyn BarsProvider>,

    /// Quote snapshot source
    pub quotes: Arc<dyn QuoteProvider>,

    /// Company profile source
    pub profiles: Arc<dyn ProfileProvider>,

    /// News headline source
    pub news: Arc<dyn NewsProvider>,

    /// Process-wide outbound call limiter
    pub limiter: Arc<RateLimiter>,

    /// Policy constants and provider settings
    pub config: AppConfig,

    /// Symbol cache (ticker -> symbol row), refreshed on metadata fill
    symbol_cache: DashMap<String, Symbol>,
}

impl AppState {
    /// Create application state with the real provider clients
    pub fn new(config: AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        tracing::info!("Data directory: {:?}", config.data_dir);

        let db_path = config.data_dir.join("tickercache.db");
        let db = Arc::new(MarketDb::new(&db_path)?);

        let limiter = Arc::new(RateLimiter::new(config.calls_per_minute));

        let massive = Arc::new(MassiveClient::new(&config, Arc::clone(&limiter))?);
        let finnhub = Arc::new(FinnhubClient::new(&config)?);
        let gdelt = Arc::new(GdeltClient::new(&config)?);

        Ok(Self {
            db,
            bars: massive,
            quotes: Arc::clone(&finnhub) as Arc<dyn QuoteProvider>,
            profiles: finnhub,
            news: gdelt,
            limiter,
            config,
            symbol_cache: DashMap::new(),
        })
    }

    /// Create application state with injected providers (tests, embedders)
    pub fn with_providers(
        config: AppConfig,
        db: Arc<MarketDb>,
        bars: Arc<dyn BarsProvider>,
        quotes: Arc<dyn QuoteProvider>,
        profiles: Arc<dyn ProfileProvider>,
        news: Arc<dyn NewsProvider>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.calls_per_minute));
        Self {
            db,
            bars,
            quotes,
            profiles,
            news,
            limiter,
            config,
            symbol_cache: DashMap::new(),
        }
    }

    /// Cached symbol row, if present
    pub fn cached_symbol(&self, ticker: &str) -> Option<Symbol> {
        self.symbol_cache.get(ticker).map(|entry| entry.clone())
    }

    /// Insert or refresh a symbol cache entry
    pub fn cache_symbol(&self, symbol: &Symbol) {
        self.symbol_cache
            .insert(symbol.ticker.clone(), symbol.clone());
    }
}
