//! News article persistence
//!
//! Articles are scoped to (symbol, calendar day) and unique on
//! (symbol, url). Rows that lose the uniqueness race to a concurrent request
//! are skipped silently.

use crate::db::is_constraint_violation;
use crate::db::models::NewsArticleRow;
use crate::error::Result;
use crate::providers::types::Headline;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, Row};

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<NewsArticleRow> {
    let raw: Option<String> = row.get(8)?;
    Ok(NewsArticleRow {
        id: row.get(0)?,
        symbol_id: row.get(1)?,
        day: row.get(2)?,
        title: row.get(3)?,
        url: row.get(4)?,
        domain: row.get(5)?,
        published_at: row.get(6)?,
        provider: row.get(7)?,
        raw: raw.and_then(|r| serde_json::from_str(&r).ok()),
        created_at: row.get(9)?,
    })
}

/// Store deduplicated headlines for one day, skipping uniqueness conflicts
pub fn insert_articles(
    conn: &Connection,
    symbol_id: i64,
    day: NaiveDate,
    headlines: &[Headline],
    provider: &str,
) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO news_articles
            (symbol_id, day, title, url, domain, published_at, provider, raw, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;

    let created_at = Utc::now();
    let mut inserted = 0;
    for headline in headlines {
        let raw = serde_json::to_string(headline)?;
        let result = stmt.execute(params![
            symbol_id,
            day,
            headline.title,
            headline.url,
            headline.domain,
            headline.published_at,
            provider,
            raw,
            created_at,
        ]);
        match result {
            Ok(_) => inserted += 1,
            Err(err) if is_constraint_violation(&err) => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(inserted)
}

/// Cached articles for (symbol, day), newest first, NULL published_at last
pub fn articles_for_day(
    conn: &Connection,
    symbol_id: i64,
    day: NaiveDate,
    limit: usize,
) -> Result<Vec<NewsArticleRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, symbol_id, day, title, url, domain, published_at, provider, raw, created_at
         FROM news_articles
         WHERE symbol_id = ?1 AND day = ?2
         ORDER BY published_at IS NULL, published_at DESC, created_at DESC
         LIMIT ?3",
    )?;

    let articles = stmt
        .query_map(params![symbol_id, day, limit as i64], article_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(articles)
}
