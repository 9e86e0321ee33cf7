//! Database row types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A tracked ticker with lazily filled descriptive metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: i64,
    pub ticker: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub mic: Option<String>,
    pub instrument_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One stored OHLCV bar; immutable once written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarRow {
    pub id: i64,
    pub symbol_id: i64,
    pub timeframe: String,
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub provider: String,
    pub fetched_at: DateTime<Utc>,
}

/// One stored quote snapshot; append-only, latest derived by quote_ts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRow {
    pub id: i64,
    pub symbol_id: i64,
    pub price: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub prev_close: Option<f64>,
    pub quote_ts: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub provider: String,
}

/// One stored headline, scoped to (symbol, calendar day)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticleRow {
    pub id: i64,
    pub symbol_id: i64,
    pub day: NaiveDate,
    pub title: String,
    pub url: String,
    pub domain: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub provider: String,
    /// Original provider payload, retained for forward compatibility
    pub raw: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Derived min/max/count of stored bars for a symbol and timeframe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageExtent {
    pub min_ts: Option<DateTime<Utc>>,
    pub max_ts: Option<DateTime<Utc>>,
    pub count: i64,
}

impl CoverageExtent {
    /// Covered date range, when any bars exist
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.min_ts, self.max_ts) {
            (Some(min), Some(max)) => Some((min.date_naive(), max.date_naive())),
            _ => None,
        }
    }
}

/// One point of a close-price series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosePoint {
    pub date: NaiveDate,
    pub close: f64,
}
