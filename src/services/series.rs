//! Series service
//!
//! Read-side queries over stored daily bars: close-price series for charting
//! and the coverage range a client can rely on without reconciling first.

use crate::db::models::ClosePoint;
use crate::error::{AppError, Result};
use crate::services::reconcile::TIMEFRAME_DAY;
use crate::services::parse_iso_date;
use crate::state::AppState;
use chrono::NaiveDate;
use serde::Serialize;

/// Stored bar coverage for one ticker
#[derive(Debug, Clone, Serialize)]
pub struct CoverageRange {
    pub ticker: String,
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
    pub count: i64,
}

/// Series service for business logic
pub struct SeriesService;

impl SeriesService {
    /// Ascending daily close series, optionally bounded by ISO dates
    pub fn close_series(
        state: &AppState,
        ticker: &str,
        start: Option<&str>,
        end: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ClosePoint>> {
        let start = parse_iso_date(start, "start")?;
        let end = parse_iso_date(end, "end")?;

        let normalized = ticker.trim().to_uppercase();
        let symbol = state
            .db
            .get_symbol(&normalized)?
            .ok_or_else(|| AppError::NotFound(format!("Unknown ticker: {}", normalized)))?;

        let limit = limit
            .unwrap_or(state.config.max_close_points)
            .min(state.config.max_close_points);
        state
            .db
            .close_series(symbol.id, TIMEFRAME_DAY, start, end, limit)
    }

    /// Min/max stored bar dates and row count for a ticker
    pub fn coverage_range(state: &AppState, ticker: &str) -> Result<CoverageRange> {
        let normalized = ticker.trim().to_uppercase();
        let symbol = state
            .db
            .get_symbol(&normalized)?
            .ok_or_else(|| AppError::NotFound(format!("Unknown ticker: {}", normalized)))?;

        let extent = state.db.coverage_extent(symbol.id, TIMEFRAME_DAY)?;
        let range = extent.date_range();
        Ok(CoverageRange {
            ticker: symbol.ticker,
            min: range.map(|(min, _)| min),
            max: range.map(|(_, max)| max),
            count: extent.count,
        })
    }
}
