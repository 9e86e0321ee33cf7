//! Symbol service
//!
//! Symbol registration and lazy metadata enrichment. Enrichment is
//! supplementary: a profile provider failure is logged and discarded so it
//! can never break the operation that triggered it.

use crate::db::models::Symbol;
use crate::error::Result;
use crate::state::AppState;
use tracing::{info, warn};

/// Symbol service for business logic
pub struct SymbolService;

impl SymbolService {
    /// Register a ticker explicitly (idempotent)
    pub fn create(state: &AppState, ticker: &str) -> Result<Symbol> {
        let symbol = state.db.get_or_create_symbol(ticker)?;
        info!("SymbolService::create - {}", symbol.ticker);
        state.cache_symbol(&symbol);
        Ok(symbol)
    }

    /// List all known symbols, ascending by ticker
    pub fn list(state: &AppState) -> Result<Vec<Symbol>> {
        state.db.list_symbols()
    }

    /// Resolve a ticker to its symbol row, creating it on first reference
    pub fn resolve(state: &AppState, ticker: &str) -> Result<Symbol> {
        let normalized = ticker.trim().to_uppercase();
        if let Some(symbol) = state.cached_symbol(&normalized) {
            return Ok(symbol);
        }

        let symbol = state.db.get_or_create_symbol(&normalized)?;
        state.cache_symbol(&symbol);
        Ok(symbol)
    }

    /// Fill absent metadata from the profile provider, best-effort
    ///
    /// A symbol with a name is considered enriched and is returned untouched.
    /// Provider failures leave the symbol as-is.
    pub async fn ensure_metadata(state: &AppState, symbol: Symbol) -> Symbol {
        if symbol.name.is_some() {
            return symbol;
        }

        match state.profiles.fetch_profile(&symbol.ticker).await {
            Ok(profile) => match state.db.fill_symbol_metadata(symbol.id, &profile) {
                Ok(updated) => {
                    state.cache_symbol(&updated);
                    updated
                }
                Err(err) => {
                    warn!("Storing metadata for {} failed: {}", symbol.ticker, err);
                    symbol
                }
            },
            Err(err) => {
                warn!("Profile fetch for {} failed: {}", symbol.ticker, err);
                symbol
            }
        }
    }
}
