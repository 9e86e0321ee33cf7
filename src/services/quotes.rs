//! Quotes service
//!
//! Snapshot ingestion and latest-quote lookup for registered symbols.

use crate::db::models::QuoteRow;
use crate::error::{AppError, Result};
use crate::state::AppState;
use tracing::info;

const QUOTE_PROVIDER: &str = "finnhub";

/// Quotes service for business logic
pub struct QuotesService;

impl QuotesService {
    /// Fetch and store a fresh snapshot for an already-registered ticker
    pub async fn ingest(state: &AppState, ticker: &str) -> Result<QuoteRow> {
        let normalized = ticker.trim().to_uppercase();
        let symbol = state
            .db
            .get_symbol(&normalized)?
            .ok_or_else(|| AppError::NotFound(format!("Unknown ticker: {}", normalized)))?;

        let quote = state.quotes.fetch_quote(&symbol.ticker).await?;
        let row = state.db.insert_quote(symbol.id, &quote, QUOTE_PROVIDER)?;
        info!("Quote for {}: {} @ {}", symbol.ticker, row.price, row.quote_ts);
        Ok(row)
    }

    /// Most recent stored snapshot for a ticker
    pub fn latest(state: &AppState, ticker: &str) -> Result<QuoteRow> {
        let normalized = ticker.trim().to_uppercase();
        let symbol = state
            .db
            .get_symbol(&normalized)?
            .ok_or_else(|| AppError::NotFound(format!("Unknown ticker: {}", normalized)))?;

        state
            .db
            .latest_quote(symbol.id)?
            .ok_or_else(|| AppError::NotFound(format!("No quotes stored for {}", normalized)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{test_state, MockQuotes, Mocks};
    use crate::services::SymbolService;

    #[tokio::test]
    async fn test_ingest_requires_registration() {
        let state = test_state();
        let err = QuotesService::ingest(&state, "AAPL").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ingest_then_latest() {
        let state = test_state();
        SymbolService::create(&state, "AAPL").unwrap();

        let stored = QuotesService::ingest(&state, "aapl").await.unwrap();
        assert_eq!(stored.price, 187.5);

        let latest = QuotesService::latest(&state, "AAPL").unwrap();
        assert_eq!(latest.id, stored.id);
        assert_eq!(latest.provider, "finnhub");
    }

    #[tokio::test]
    async fn test_latest_without_quotes_is_not_found() {
        let state = test_state();
        SymbolService::create(&state, "AAPL").unwrap();

        let err = QuotesService::latest(&state, "AAPL").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ingest_propagates_provider_failure() {
        let state = Mocks {
            quotes: MockQuotes::failing(),
            ..Mocks::default()
        }
        .into_state();
        SymbolService::create(&state, "AAPL").unwrap();

        let err = QuotesService::ingest(&state, "AAPL").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
