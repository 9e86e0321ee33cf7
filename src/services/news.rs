//! News service
//!
//! Day-scoped headlines with a cache-first policy. Once any articles exist
//! for a (symbol, day), that cached set is authoritative and the provider is
//! never consulted for the day again.

use crate::db::models::NewsArticleRow;
use crate::error::Result;
use crate::providers::types::Headline;
use crate::services::SymbolService;
use crate::state::AppState;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

const NEWS_PROVIDER: &str = "gdelt";

/// Headlines served for one (ticker, day)
#[derive(Debug, Clone, Serialize)]
pub struct NewsResult {
    pub ticker: String,
    pub date: NaiveDate,
    pub cached: bool,
    pub headlines: Vec<NewsArticleRow>,
}

/// News service for business logic
pub struct NewsService;

impl NewsService {
    /// Headlines for `ticker` on `day`, serving the cache when it has any
    ///
    /// On a miss the provider is queried for `limit` headlines, results are
    /// deduplicated and persisted, and the stored rows are returned so a
    /// concurrent request landing first still yields a consistent answer.
    pub async fn headlines_for_day(
        state: &AppState,
        ticker: &str,
        day: NaiveDate,
        limit: usize,
    ) -> Result<NewsResult> {
        let symbol = SymbolService::resolve(state, ticker)?;
        let symbol = SymbolService::ensure_metadata(state, symbol).await;

        let overfetch = limit.max(1) * state.config.news_overfetch_multiplier;

        let cached = state.db.articles_for_day(symbol.id, day, overfetch)?;
        if !cached.is_empty() {
            let rows = dedupe_rows(cached, limit);
            debug!(
                "News cache hit for {} {}: {} article(s)",
                symbol.ticker,
                day,
                rows.len()
            );
            return Ok(NewsResult {
                ticker: symbol.ticker,
                date: day,
                cached: true,
                headlines: rows,
            });
        }

        let raw = state
            .news
            .get_headlines(&symbol.ticker, symbol.name.as_deref(), day, limit)
            .await?;
        let fetched = raw.len();
        let unique = dedupe_headlines(raw, limit);

        let stored = state
            .db
            .insert_articles(symbol.id, day, &unique, NEWS_PROVIDER)?;
        info!(
            "News for {} {}: fetched {}, kept {}, stored {}",
            symbol.ticker,
            day,
            fetched,
            unique.len(),
            stored
        );

        let rows = dedupe_rows(state.db.articles_for_day(symbol.id, day, overfetch)?, limit);
        Ok(NewsResult {
            ticker: symbol.ticker,
            date: day,
            cached: false,
            headlines: rows,
        })
    }
}

fn dedupe_key(url: &str, title: &str) -> Option<String> {
    if !url.is_empty() {
        Some(url.to_lowercase())
    } else if !title.is_empty() {
        Some(title.to_lowercase())
    } else {
        None
    }
}

/// Same identity rule as [`dedupe_headlines`], applied to stored rows
fn dedupe_rows(rows: Vec<NewsArticleRow>, limit: usize) -> Vec<NewsArticleRow> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for row in rows {
        if let Some(key) = dedupe_key(row.url.trim(), row.title.trim()) {
            if seen.insert(key) {
                unique.push(row);
                if unique.len() == limit {
                    break;
                }
            }
        }
    }
    unique
}

/// Collapse duplicate headlines, keeping first occurrences, capped at `limit`
///
/// Identity is the lowercased URL, falling back to the lowercased title when
/// the URL is blank. Entries with neither are dropped.
pub fn dedupe_headlines(headlines: Vec<Headline>, limit: usize) -> Vec<Headline> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for mut headline in headlines {
        headline.title = headline.title.trim().to_string();
        headline.url = headline.url.trim().to_string();

        let key = match dedupe_key(&headline.url, &headline.title) {
            Some(key) => key,
            None => continue,
        };

        if seen.insert(key) {
            unique.push(headline);
            if unique.len() == limit {
                break;
            }
        }
    }
    unique
}
