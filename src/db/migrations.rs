//! SQLite database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    // Run each migration
    run_migration(conn, "001_symbols", CREATE_SYMBOLS_TABLE)?;
    run_migration(conn, "002_quotes", CREATE_QUOTES_TABLE)?;
    run_migration(conn, "003_bars", CREATE_BARS_TABLE)?;
    run_migration(conn, "004_news_articles", CREATE_NEWS_ARTICLES_TABLE)?;

    tracing::info!("Database migrations completed");
    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    // Check if migration already applied
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Running migration: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    }

    Ok(())
}

const CREATE_SYMBOLS_TABLE: &str = r#"
CREATE TABLE symbols (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticker TEXT NOT NULL UNIQUE,
    name TEXT,
    exchange TEXT,
    country TEXT,
    currency TEXT,
    mic TEXT,
    instrument_type TEXT,
    created_at TEXT NOT NULL
);
"#;

const CREATE_QUOTES_TABLE: &str = r#"
CREATE TABLE quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol_id INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    price REAL NOT NULL,
    open REAL,
    high REAL,
    low REAL,
    prev_close REAL,
    quote_ts TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    provider TEXT NOT NULL
);
CREATE INDEX idx_quotes_symbol_ts ON quotes(symbol_id, quote_ts DESC);
"#;

const CREATE_BARS_TABLE: &str = r#"
CREATE TABLE bars (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol_id INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    timeframe TEXT NOT NULL,
    ts TEXT NOT NULL,
    open REAL NOT NULL,
    high REAL NOT NULL,
    low REAL NOT NULL,
    close REAL NOT NULL,
    volume REAL,
    provider TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    UNIQUE(symbol_id, timeframe, ts)
);
CREATE INDEX idx_bars_symbol_timeframe_ts ON bars(symbol_id, timeframe, ts);
"#;

const CREATE_NEWS_ARTICLES_TABLE: &str = r#"
CREATE TABLE news_articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol_id INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    day TEXT NOT NULL,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    domain TEXT,
    published_at TEXT,
    provider TEXT NOT NULL,
    raw TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(symbol_id, url)
);
CREATE INDEX idx_news_symbol_day ON news_articles(symbol_id, day);
"#;
