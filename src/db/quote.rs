//! Quote persistence
//!
//! Append-only; "latest" is derived by ordering on the provider-supplied
//! quote timestamp, never by mutating a current row.

use crate::db::models::QuoteRow;
use crate::error::Result;
use crate::providers::types::QuoteSnapshot;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

fn quote_from_row(row: &Row<'_>) -> rusqlite::Result<QuoteRow> {
    Ok(QuoteRow {
        id: row.get(0)?,
        symbol_id: row.get(1)?,
        price: row.get(2)?,
        open: row.get(3)?,
        high: row.get(4)?,
        low: row.get(5)?,
        prev_close: row.get(6)?,
        quote_ts: row.get(7)?,
        fetched_at: row.get(8)?,
        provider: row.get(9)?,
    })
}

/// Append a quote snapshot, returning the stored row
pub fn insert_quote(
    conn: &Connection,
    symbol_id: i64,
    quote: &QuoteSnapshot,
    provider: &str,
) -> Result<QuoteRow> {
    conn.execute(
        "INSERT INTO quotes
            (symbol_id, price, open, high, low, prev_close, quote_ts, fetched_at, provider)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            symbol_id,
            quote.price,
            quote.open,
            quote.high,
            quote.low,
            quote.prev_close,
            quote.quote_ts,
            Utc::now(),
            provider,
        ],
    )?;

    let id = conn.last_insert_rowid();
    conn.query_row(
        "SELECT id, symbol_id, price, open, high, low, prev_close, quote_ts, fetched_at, provider
         FROM quotes WHERE id = ?1",
        params![id],
        quote_from_row,
    )
    .map_err(Into::into)
}

/// Newest stored quote for a symbol, by quote timestamp
pub fn latest_quote(conn: &Connection, symbol_id: i64) -> Result<Option<QuoteRow>> {
    let quote = conn
        .query_row(
            "SELECT id, symbol_id, price, open, high, low, prev_close, quote_ts, fetched_at, provider
             FROM quotes
             WHERE symbol_id = ?1
             ORDER BY quote_ts DESC
             LIMIT 1",
            params![symbol_id],
            quote_from_row,
        )
        .optional()?;
    Ok(quote)
}
