//! Services layer
//!
//! Business logic called by the external HTTP routing layer. Services own the
//! cache-or-fetch decisions; persistence lives in [`crate::db`] and upstream
//! access behind the [`crate::providers`] traits.
//!
//! # Services
//!
//! - `ReconcileService` - gap-filling confirmation of bar coverage
//! - `NewsService` - day-scoped headlines, cache-first with deduplication
//! - `QuotesService` - quote ingestion and latest-quote lookup
//! - `SeriesService` - close-price series and coverage range queries
//! - `SymbolService` - symbol registration and lazy metadata enrichment

pub mod reconcile;
pub mod news;
pub mod quotes;
pub mod series;
pub mod symbols;

use crate::error::{AppError, Result};
use chrono::NaiveDate;

// Re-export commonly used types and services
pub use reconcile::{ConfirmResult, DateRange, ReconcileService};
pub use news::{NewsResult, NewsService};
pub use quotes::QuotesService;
pub use series::{CoverageRange, SeriesService};
pub use symbols::SymbolService;

/// Parse an optional ISO `YYYY-MM-DD` parameter, naming the field on failure
pub(crate) fn parse_iso_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{} must be YYYY-MM-DD", field))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date(None, "start").unwrap(), None);
        assert_eq!(parse_iso_date(Some("  "), "start").unwrap(), None);
        assert_eq!(
            parse_iso_date(Some(" 2024-01-05 "), "start").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );

        let err = parse_iso_date(Some("05/01/2024"), "start").unwrap_err();
        assert!(err.to_string().contains("start must be YYYY-MM-DD"));
    }
}
