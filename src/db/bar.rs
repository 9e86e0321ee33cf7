//! Bar persistence
//!
//! Bars are immutable once written; at most one bar exists per
//! (symbol, timeframe, ts), enforced by the table's uniqueness constraint.
//! Inserts that lose a uniqueness race are skipped, never merged.

use crate::db::is_constraint_violation;
use crate::db::models::{ClosePoint, CoverageExtent};
use crate::error::Result;
use crate::providers::types::BarRecord;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection};
use tracing::debug;

const INSERT_BAR: &str = "INSERT INTO bars
    (symbol_id, timeframe, ts, open, high, low, close, volume, provider, fetched_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

// Sentinel bounds for unbounded series queries. The ts column is text, so
// the sentinels must be dates that still compare correctly lexicographically.
const EARLIEST: NaiveDate = match NaiveDate::from_ymd_opt(1000, 1, 1) {
    Some(d) => d,
    None => unreachable!(),
};
const LATEST: NaiveDate = match NaiveDate::from_ymd_opt(9999, 12, 31) {
    Some(d) => d,
    None => unreachable!(),
};
const DAY_END: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(t) => t,
    None => unreachable!(),
};

/// Insert fetched bars, returning how many actually landed
///
/// The whole batch goes in one transaction first. If any row violates the
/// uniqueness constraint (a concurrent fetch covered an overlapping range),
/// the batch is rolled back and retried row by row so that only the
/// conflicting rows are skipped. Repeating an insert of the same bars is
/// therefore a no-op, never an error.
pub fn insert_bars(
    conn: &mut Connection,
    symbol_id: i64,
    timeframe: &str,
    bars: &[BarRecord],
    provider: &str,
) -> Result<usize> {
    if bars.is_empty() {
        return Ok(0);
    }

    let fetched_at = Utc::now();

    match insert_batch(conn, symbol_id, timeframe, bars, provider, fetched_at) {
        Ok(count) => Ok(count),
        Err(err) if is_constraint_violation(&err) => {
            debug!(
                "Bar batch for symbol {} hit a uniqueness conflict; retrying row by row",
                symbol_id
            );
            insert_rows_individually(conn, symbol_id, timeframe, bars, provider, fetched_at)
        }
        Err(err) => Err(err.into()),
    }
}

fn insert_batch(
    conn: &mut Connection,
    symbol_id: i64,
    timeframe: &str,
    bars: &[BarRecord],
    provider: &str,
    fetched_at: DateTime<Utc>,
) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(INSERT_BAR)?;
        for bar in bars {
            stmt.execute(params![
                symbol_id,
                timeframe,
                bar.ts,
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume,
                provider,
                fetched_at,
            ])?;
        }
    }
    tx.commit()?;
    Ok(bars.len())
}

fn insert_rows_individually(
    conn: &Connection,
    symbol_id: i64,
    timeframe: &str,
    bars: &[BarRecord],
    provider: &str,
    fetched_at: DateTime<Utc>,
) -> Result<usize> {
    let mut stmt = conn.prepare(INSERT_BAR)?;

    let mut inserted = 0;
    for bar in bars {
        let result = stmt.execute(params![
            symbol_id,
            timeframe,
            bar.ts,
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume,
            provider,
            fetched_at,
        ]);
        match result {
            Ok(_) => inserted += 1,
            Err(err) if is_constraint_violation(&err) => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(inserted)
}

/// Min/max/count of stored bars for one symbol and timeframe
pub fn coverage_extent(
    conn: &Connection,
    symbol_id: i64,
    timeframe: &str,
) -> Result<CoverageExtent> {
    let extent = conn.query_row(
        "SELECT MIN(ts), MAX(ts), COUNT(*) FROM bars WHERE symbol_id = ?1 AND timeframe = ?2",
        params![symbol_id, timeframe],
        |row| {
            Ok(CoverageExtent {
                min_ts: row.get(0)?,
                max_ts: row.get(1)?,
                count: row.get(2)?,
            })
        },
    )?;
    Ok(extent)
}

/// Ascending (date, close) series, optionally bounded, capped at `limit`
pub fn close_series(
    conn: &Connection,
    symbol_id: i64,
    timeframe: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    limit: usize,
) -> Result<Vec<ClosePoint>> {
    let lower = start.unwrap_or(EARLIEST).and_time(NaiveTime::MIN).and_utc();
    let upper = end.unwrap_or(LATEST).and_time(DAY_END).and_utc();

    let mut stmt = conn.prepare(
        "SELECT ts, close FROM bars
         WHERE symbol_id = ?1 AND timeframe = ?2 AND ts >= ?3 AND ts <= ?4
         ORDER BY ts ASC
         LIMIT ?5",
    )?;

    let points = stmt
        .query_map(
            params![symbol_id, timeframe, lower, upper, limit as i64],
            |row| {
                let ts: DateTime<Utc> = row.get(0)?;
                Ok(ClosePoint {
                    date: ts.date_naive(),
                    close: row.get(1)?,
                })
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(points)
}
