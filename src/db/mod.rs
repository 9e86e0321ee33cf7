//! SQLite database module
//!
//! One connection guarded by a mutex, WAL mode for concurrent readers. All
//! market data (symbols, quotes, bars, news) lives in a single file; child
//! rows cascade on symbol deletion.

pub mod models;
mod migrations;
mod symbol;
mod bar;
mod quote;
mod news;

use crate::error::Result;
use crate::providers::types::{BarRecord, CompanyProfile, Headline, QuoteSnapshot};
use chrono::NaiveDate;
use models::*;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

/// Returns true when an insert failed on a uniqueness (or other) constraint
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// SQLite database wrapper
pub struct MarketDb {
    conn: Mutex<Connection>,
}

impl MarketDb {
    /// Open (or create) the database at `path` and apply migrations
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory database, used by tests and ephemeral tooling
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // WAL for better concurrent access; enforce FK cascades.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    // ========== Symbols ==========

    /// Look up a symbol by ticker
    pub fn get_symbol(&self, ticker: &str) -> Result<Option<Symbol>> {
        let conn = self.conn.lock();
        symbol::get_symbol(&conn, ticker)
    }

    /// Get an existing symbol or create it on first reference
    pub fn get_or_create_symbol(&self, ticker: &str) -> Result<Symbol> {
        let conn = self.conn.lock();
        symbol::get_or_create_symbol(&conn, ticker)
    }

    /// Fill absent metadata fields from a fetched profile
    pub fn fill_symbol_metadata(&self, symbol_id: i64, profile: &CompanyProfile) -> Result<Symbol> {
        let conn = self.conn.lock();
        symbol::fill_symbol_metadata(&conn, symbol_id, profile)
    }

    /// List all symbols, ascending by ticker
    pub fn list_symbols(&self) -> Result<Vec<Symbol>> {
        let conn = self.conn.lock();
        symbol::list_symbols(&conn)
    }

    // ========== Quotes ==========

    /// Append a quote snapshot
    pub fn insert_quote(
        &self,
        symbol_id: i64,
        quote: &QuoteSnapshot,
        provider: &str,
    ) -> Result<QuoteRow> {
        let conn = self.conn.lock();
        quote::insert_quote(&conn, symbol_id, quote, provider)
    }

    /// Newest stored quote for a symbol
    pub fn latest_quote(&self, symbol_id: i64) -> Result<Option<QuoteRow>> {
        let conn = self.conn.lock();
        quote::latest_quote(&conn, symbol_id)
    }

    // ========== Bars ==========

    /// Insert fetched bars idempotently; returns how many actually landed
    pub fn insert_bars(
        &self,
        symbol_id: i64,
        timeframe: &str,
        bars: &[BarRecord],
        provider: &str,
    ) -> Result<usize> {
        let mut conn = self.conn.lock();
        bar::insert_bars(&mut conn, symbol_id, timeframe, bars, provider)
    }

    /// Min/max/count of stored bars for one symbol and timeframe
    pub fn coverage_extent(&self, symbol_id: i64, timeframe: &str) -> Result<CoverageExtent> {
        let conn = self.conn.lock();
        bar::coverage_extent(&conn, symbol_id, timeframe)
    }

    /// Ascending close series, optionally bounded, capped at `limit`
    pub fn close_series(
        &self,
        symbol_id: i64,
        timeframe: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        limit: usize,
    ) -> Result<Vec<ClosePoint>> {
        let conn = self.conn.lock();
        bar::close_series(&conn, symbol_id, timeframe, start, end, limit)
    }

    // ========== News ==========

    /// Store deduplicated headlines for one day, skipping conflicts
    pub fn insert_articles(
        &self,
        symbol_id: i64,
        day: NaiveDate,
        headlines: &[Headline],
        provider: &str,
    ) -> Result<usize> {
        let conn = self.conn.lock();
        news::insert_articles(&conn, symbol_id, day, headlines, provider)
    }

    /// Cached articles for (symbol, day), newest first
    pub fn articles_for_day(
        &self,
        symbol_id: i64,
        day: NaiveDate,
        limit: usize,
    ) -> Result<Vec<NewsArticleRow>> {
        let conn = self.conn.lock();
        news::articles_for_day(&conn, symbol_id, day, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(day: u32, close: f64) -> BarRecord {
        BarRecord {
            ts: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: Some(1_000.0),
        }
    }

    fn headline(title: &str, url: &str) -> Headline {
        Headline {
            title: title.to_string(),
            url: url.to_string(),
            domain: Some("example.com".to_string()),
            published_at: None,
        }
    }

    #[test]
    fn test_get_or_create_symbol_normalizes_and_reuses() {
        let db = MarketDb::in_memory().unwrap();

        let a = db.get_or_create_symbol(" aapl ").unwrap();
        assert_eq!(a.ticker, "AAPL");

        let b = db.get_or_create_symbol("AAPL").unwrap();
        assert_eq!(a.id, b.id);

        assert!(db.get_or_create_symbol("   ").is_err());
    }

    #[test]
    fn test_metadata_fills_only_absent_fields() {
        let db = MarketDb::in_memory().unwrap();
        let sym = db.get_or_create_symbol("AAPL").unwrap();

        let first = CompanyProfile {
            name: Some("Apple Inc".to_string()),
            ..CompanyProfile::default()
        };
        let sym = db.fill_symbol_metadata(sym.id, &first).unwrap();
        assert_eq!(sym.name.as_deref(), Some("Apple Inc"));
        assert!(sym.exchange.is_none());

        // A later profile must not overwrite the name, only fill gaps.
        let second = CompanyProfile {
            name: Some("Apple Incorporated".to_string()),
            exchange: Some("NASDAQ".to_string()),
            ..CompanyProfile::default()
        };
        let sym = db.fill_symbol_metadata(sym.id, &second).unwrap();
        assert_eq!(sym.name.as_deref(), Some("Apple Inc"));
        assert_eq!(sym.exchange.as_deref(), Some("NASDAQ"));
    }

    #[test]
    fn test_list_symbols_ascending() {
        let db = MarketDb::in_memory().unwrap();
        db.get_or_create_symbol("MSFT").unwrap();
        db.get_or_create_symbol("AAPL").unwrap();

        let tickers: Vec<String> = db
            .list_symbols()
            .unwrap()
            .into_iter()
            .map(|s| s.ticker)
            .collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_insert_bars_batch_and_extent() {
        let db = MarketDb::in_memory().unwrap();
        let sym = db.get_or_create_symbol("AAPL").unwrap();

        let inserted = db
            .insert_bars(sym.id, "1d", &[bar(2, 10.0), bar(3, 11.0), bar(4, 12.0)], "massive")
            .unwrap();
        assert_eq!(inserted, 3);

        let extent = db.coverage_extent(sym.id, "1d").unwrap();
        assert_eq!(extent.count, 3);
        let (start, end) = extent.date_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[test]
    fn test_insert_bars_overlap_falls_back_to_row_by_row() {
        let db = MarketDb::in_memory().unwrap();
        let sym = db.get_or_create_symbol("AAPL").unwrap();

        db.insert_bars(sym.id, "1d", &[bar(2, 10.0), bar(3, 11.0)], "massive")
            .unwrap();

        // Overlapping batch: only the genuinely new rows land.
        let inserted = db
            .insert_bars(
                sym.id,
                "1d",
                &[bar(3, 99.0), bar(4, 12.0), bar(5, 13.0)],
                "massive",
            )
            .unwrap();
        assert_eq!(inserted, 2);

        // The conflicting row kept its original close (immutable, not merged).
        let series = db.close_series(sym.id, "1d", None, None, 100).unwrap();
        let jan3 = series
            .iter()
            .find(|p| p.date == NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
            .unwrap();
        assert_eq!(jan3.close, 11.0);
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn test_insert_bars_identical_batch_is_noop() {
        let db = MarketDb::in_memory().unwrap();
        let sym = db.get_or_create_symbol("AAPL").unwrap();
        let bars = [bar(2, 10.0), bar(3, 11.0)];

        assert_eq!(db.insert_bars(sym.id, "1d", &bars, "massive").unwrap(), 2);
        assert_eq!(db.insert_bars(sym.id, "1d", &bars, "massive").unwrap(), 0);
        assert_eq!(db.coverage_extent(sym.id, "1d").unwrap().count, 2);
    }

    #[test]
    fn test_timeframes_are_isolated() {
        let db = MarketDb::in_memory().unwrap();
        let sym = db.get_or_create_symbol("AAPL").unwrap();

        db.insert_bars(sym.id, "1d", &[bar(2, 10.0)], "massive").unwrap();
        let extent = db.coverage_extent(sym.id, "1h").unwrap();
        assert_eq!(extent.count, 0);
        assert!(extent.date_range().is_none());
    }

    #[test]
    fn test_close_series_bounds_and_limit() {
        let db = MarketDb::in_memory().unwrap();
        let sym = db.get_or_create_symbol("AAPL").unwrap();
        db.insert_bars(
            sym.id,
            "1d",
            &[bar(2, 10.0), bar(3, 11.0), bar(4, 12.0), bar(5, 13.0)],
            "massive",
        )
        .unwrap();

        let bounded = db
            .close_series(
                sym.id,
                "1d",
                NaiveDate::from_ymd_opt(2024, 1, 3),
                NaiveDate::from_ymd_opt(2024, 1, 4),
                100,
            )
            .unwrap();
        assert_eq!(bounded.len(), 2);
        assert_eq!(bounded[0].close, 11.0);

        let capped = db.close_series(sym.id, "1d", None, None, 3).unwrap();
        assert_eq!(capped.len(), 3);
        assert_eq!(capped[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_quote_latest_by_quote_ts() {
        let db = MarketDb::in_memory().unwrap();
        let sym = db.get_or_create_symbol("AAPL").unwrap();

        let older = QuoteSnapshot {
            price: 100.0,
            open: None,
            high: None,
            low: None,
            prev_close: None,
            quote_ts: Utc.with_ymd_and_hms(2024, 1, 5, 15, 0, 0).unwrap(),
        };
        let newer = QuoteSnapshot {
            price: 101.5,
            quote_ts: Utc.with_ymd_and_hms(2024, 1, 5, 16, 0, 0).unwrap(),
            ..older.clone()
        };

        // Insert newest first; ordering must come from quote_ts, not rowid.
        db.insert_quote(sym.id, &newer, "finnhub").unwrap();
        db.insert_quote(sym.id, &older, "finnhub").unwrap();

        let latest = db.latest_quote(sym.id).unwrap().unwrap();
        assert_eq!(latest.price, 101.5);
    }

    #[test]
    fn test_articles_unique_per_symbol_url() {
        let db = MarketDb::in_memory().unwrap();
        let sym = db.get_or_create_symbol("AAPL").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();

        let first = [
            headline("Apple hits record", "https://news.test/a"),
            headline("Apple ships product", "https://news.test/b"),
        ];
        assert_eq!(db.insert_articles(sym.id, day, &first, "gdelt").unwrap(), 2);

        // Same URL surfacing again (other day, other title) is skipped.
        let next_day = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let again = [headline("Apple record redux", "https://news.test/a")];
        assert_eq!(db.insert_articles(sym.id, next_day, &again, "gdelt").unwrap(), 0);

        let cached = db.articles_for_day(sym.id, day, 10).unwrap();
        assert_eq!(cached.len(), 2);
        assert!(db.articles_for_day(sym.id, next_day, 10).unwrap().is_empty());
    }

    #[test]
    fn test_reopen_preserves_data_and_skips_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickercache.db");

        {
            let db = MarketDb::new(&path).unwrap();
            let sym = db.get_or_create_symbol("AAPL").unwrap();
            db.insert_bars(sym.id, "1d", &[bar(2, 10.0)], "massive").unwrap();
        }

        let db = MarketDb::new(&path).unwrap();
        let sym = db.get_symbol("AAPL").unwrap().unwrap();
        assert_eq!(db.coverage_extent(sym.id, "1d").unwrap().count, 1);
    }

    #[test]
    fn test_cascade_delete_on_symbol_removal() {
        let db = MarketDb::in_memory().unwrap();
        let sym = db.get_or_create_symbol("AAPL").unwrap();
        db.insert_bars(sym.id, "1d", &[bar(2, 10.0)], "massive").unwrap();

        {
            let conn = db.conn.lock();
            conn.execute("DELETE FROM symbols WHERE id = ?1", [sym.id]).unwrap();
        }
        assert_eq!(db.coverage_extent(sym.id, "1d").unwrap().count, 0);
    }
}
