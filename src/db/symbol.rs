//! Symbol persistence
//!
//! Tickers are stored uppercased and trimmed. Descriptive metadata is filled
//! lazily and only where absent; a populated field is never overwritten.

use crate::db::models::Symbol;
use crate::error::{AppError, Result};
use crate::providers::types::CompanyProfile;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

fn symbol_from_row(row: &Row<'_>) -> rusqlite::Result<Symbol> {
    Ok(Symbol {
        id: row.get(0)?,
        ticker: row.get(1)?,
        name: row.get(2)?,
        exchange: row.get(3)?,
        country: row.get(4)?,
        currency: row.get(5)?,
        mic: row.get(6)?,
        instrument_type: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const SYMBOL_COLUMNS: &str =
    "id, ticker, name, exchange, country, currency, mic, instrument_type, created_at";

/// Normalize a raw ticker; empty input is a validation error
pub fn normalize_ticker(ticker: &str) -> Result<String> {
    let t = ticker.trim().to_uppercase();
    if t.is_empty() {
        return Err(AppError::Validation("ticker is empty".to_string()));
    }
    Ok(t)
}

/// Look up a symbol by ticker
pub fn get_symbol(conn: &Connection, ticker: &str) -> Result<Option<Symbol>> {
    let ticker = normalize_ticker(ticker)?;
    let symbol = conn
        .query_row(
            &format!("SELECT {} FROM symbols WHERE ticker = ?1", SYMBOL_COLUMNS),
            params![ticker],
            symbol_from_row,
        )
        .optional()?;
    Ok(symbol)
}

/// Get an existing symbol or create it on first reference
///
/// INSERT OR IGNORE followed by a re-select keeps this safe when two requests
/// register the same ticker concurrently.
pub fn get_or_create_symbol(conn: &Connection, ticker: &str) -> Result<Symbol> {
    let ticker = normalize_ticker(ticker)?;

    conn.execute(
        "INSERT OR IGNORE INTO symbols (ticker, created_at) VALUES (?1, ?2)",
        params![ticker, Utc::now()],
    )?;

    get_symbol(conn, &ticker)?
        .ok_or_else(|| AppError::Internal(format!("Symbol {} missing after insert", ticker)))
}

/// Fill absent metadata fields from a fetched profile, returning the fresh row
pub fn fill_symbol_metadata(
    conn: &Connection,
    symbol_id: i64,
    profile: &CompanyProfile,
) -> Result<Symbol> {
    conn.execute(
        "UPDATE symbols SET
            name = COALESCE(name, ?1),
            exchange = COALESCE(exchange, ?2),
            country = COALESCE(country, ?3),
            currency = COALESCE(currency, ?4),
            mic = COALESCE(mic, ?5),
            instrument_type = COALESCE(instrument_type, ?6)
         WHERE id = ?7",
        params![
            profile.name,
            profile.exchange,
            profile.country,
            profile.currency,
            profile.mic,
            profile.instrument_type,
            symbol_id,
        ],
    )?;

    conn.query_row(
        &format!("SELECT {} FROM symbols WHERE id = ?1", SYMBOL_COLUMNS),
        params![symbol_id],
        symbol_from_row,
    )
    .map_err(Into::into)
}

/// List all symbols, ascending by ticker
pub fn list_symbols(conn: &Connection) -> Result<Vec<Symbol>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM symbols ORDER BY ticker ASC",
        SYMBOL_COLUMNS
    ))?;

    let symbols = stmt
        .query_map([], symbol_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(symbols)
}
