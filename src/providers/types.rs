//! Normalized provider record types
//!
//! Upstream responses are heterogeneous; every provider maps its payload into
//! these shapes at the boundary. Required fields fail closed during mapping,
//! optional fields default to absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV observation as returned by a bars provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarRecord {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

/// Point-in-time quote snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub price: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub prev_close: Option<f64>,
    pub quote_ts: DateTime<Utc>,
}

/// Company profile metadata; any field the upstream omits stays absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub mic: Option<String>,
    pub instrument_type: Option<String>,
}

/// One news headline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub url: String,
    pub domain: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}
