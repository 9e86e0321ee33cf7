//! Gap reconciler
//!
//! Confirms that the local bar cache covers a requested date range, fetching
//! only the missing left/right edges from the history provider. Already-cached
//! interior days are never re-fetched, so repeated confirmations of the same
//! range insert nothing after the first.

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::services::{parse_iso_date, SymbolService};
use crate::state::AppState;
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Daily timeframe tag under which confirmed bars are stored
pub const TIMEFRAME_DAY: &str = "1d";

const BARS_PROVIDER: &str = "massive";
const QUOTE_PROVIDER: &str = "finnhub";

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Outcome of one coverage confirmation
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmResult {
    pub ticker: String,
    pub name: Option<String>,
    /// Requested range after clamping to provider reality
    pub desired_range: DateRange,
    /// Edge gaps that had to be fetched, left before right
    pub missing_ranges: Vec<DateRange>,
    pub bars_fetched: usize,
    pub bars_inserted: usize,
    /// Stored coverage after reconciliation, if any bars exist
    pub have_range_after: Option<DateRange>,
}

/// Gap reconciler service for business logic
pub struct ReconcileService;

impl ReconcileService {
    /// Confirm bar coverage for `ticker` over `[start, end]`, filling gaps
    ///
    /// Omitted bounds default to the configured history window ending at the
    /// newest date the provider can serve. Provider errors abort after any
    /// already-merged gap has been committed; a later confirmation resumes
    /// from the smaller remaining gap.
    pub async fn confirm(
        state: &AppState,
        ticker: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<ConfirmResult> {
        let start = parse_iso_date(start, "start")?;
        let end = parse_iso_date(end, "end")?;

        let symbol = SymbolService::resolve(state, ticker)?;
        let symbol = SymbolService::ensure_metadata(state, symbol).await;

        let today = Utc::now().date_naive();
        let desired = clamp_desired_range(start, end, today, &state.config)?;

        // Opportunistic quote refresh. Never blocks the confirmation.
        match state.quotes.fetch_quote(&symbol.ticker).await {
            Ok(quote) => {
                if let Err(err) = state.db.insert_quote(symbol.id, &quote, QUOTE_PROVIDER) {
                    warn!("Storing quote for {} failed: {}", symbol.ticker, err);
                }
            }
            Err(err) => warn!("Quote refresh for {} failed: {}", symbol.ticker, err),
        }

        let have = state
            .db
            .coverage_extent(symbol.id, TIMEFRAME_DAY)?
            .date_range();
        let gaps = compute_gaps(have, desired);

        debug!(
            "Confirm {} {} -> {}: have {:?}, {} gap(s)",
            symbol.ticker,
            desired.start,
            desired.end,
            have,
            gaps.len()
        );

        let mut bars_fetched = 0;
        let mut bars_inserted = 0;
        for gap in &gaps {
            let bars = state
                .bars
                .fetch_bars(
                    &symbol.ticker,
                    &gap.start.to_string(),
                    &gap.end.to_string(),
                    1,
                    "day",
                )
                .await?;
            bars_fetched += bars.len();
            bars_inserted += state
                .db
                .insert_bars(symbol.id, TIMEFRAME_DAY, &bars, BARS_PROVIDER)?;
        }

        let have_after = state
            .db
            .coverage_extent(symbol.id, TIMEFRAME_DAY)?
            .date_range()
            .map(|(start, end)| DateRange { start, end });

        info!(
            "Confirmed {}: fetched {} bar(s), inserted {}",
            symbol.ticker, bars_fetched, bars_inserted
        );

        Ok(ConfirmResult {
            ticker: symbol.ticker,
            name: symbol.name,
            desired_range: desired,
            missing_ranges: gaps,
            bars_fetched,
            bars_inserted,
            have_range_after: have_after,
        })
    }
}

/// Clamp a requested range to what the provider can actually serve
///
/// The end is pulled back behind the provider's publication delay; the start
/// defaults to the configured history window and is floored so the range never
/// exceeds the maximum lookback.
pub fn clamp_desired_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
    config: &AppConfig,
) -> Result<DateRange> {
    let latest = today - Duration::days(config.provider_delay_days);
    let end = end.map_or(latest, |e| e.min(latest));

    let start = start.unwrap_or(end - Duration::days(config.default_history_days));
    let start = start.max(end - Duration::days(config.max_history_days));

    if start > end {
        return Err(AppError::InvalidRange(format!(
            "start {} is after end {}",
            start, end
        )));
    }
    Ok(DateRange { start, end })
}

/// Edge gaps between stored coverage and the desired range
///
/// Coverage is treated as contiguous between its extremes, so at most two
/// gaps come back: days before the oldest stored bar and days after the
/// newest one. A desired range disjoint from coverage yields a gap reaching
/// all the way to the stored extent, keeping coverage contiguous after the
/// fill. No coverage at all yields the full desired range.
pub fn compute_gaps(have: Option<(NaiveDate, NaiveDate)>, desired: DateRange) -> Vec<DateRange> {
    let (have_start, have_end) = match have {
        None => return vec![desired],
        Some(extent) => extent,
    };

    let mut gaps = Vec::new();
    if desired.start < have_start {
        gaps.push(DateRange {
            start: desired.start,
            end: have_start - Duration::days(1),
        });
    }
    if desired.end > have_end {
        gaps.push(DateRange {
            start: have_end + Duration::days(1),
            end: desired.end,
        });
    }
    gaps
}
