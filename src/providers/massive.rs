//! Massive (Polygon-compatible) aggregates client
//!
//! Fetches daily OHLCV bars. Date input is validated and clamped before any
//! network traffic; HTTP outcomes are classified into fatal (auth, bad
//! request) and retryable (everything else) failures.

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::providers::types::BarRecord;
use crate::providers::{BarsProvider, RateLimiter};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Aggregate endpoint max rows per request
const AGG_LIMIT: u32 = 50_000;

/// The provider rejects dates before the Unix epoch
const HISTORY_FLOOR: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(d) => d,
    None => unreachable!(),
};

/// Polygon-compatible bars provider
pub struct MassiveClient {
    client: Client,
    base_url: String,
    api_key: String,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    backoff_base: Duration,
}

#[derive(Deserialize)]
struct AggsResponse {
    results: Option<Vec<AggBar>>,
}

#[derive(Deserialize)]
struct AggBar {
    /// Bar start, Unix milliseconds
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: Option<f64>,
}

impl MassiveClient {
    pub fn new(config: &AppConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.bars_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.massive_base_url.clone(),
            api_key: config.massive_api_key.clone(),
            limiter,
            max_retries: config.bar_fetch_retries,
            backoff_base: config.retry_backoff_base,
        })
    }

    fn require_key(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(AppError::Config(
                "MASSIVE_API_KEY is missing. Set it in the environment.".to_string(),
            ));
        }
        Ok(())
    }

    fn agg_url(
        &self,
        ticker: &str,
        multiplier: u32,
        timespan: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> String {
        format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}?adjusted=true&sort=asc&limit={}&apiKey={}",
            self.base_url, ticker, multiplier, timespan, date_from, date_to, AGG_LIMIT, self.api_key
        )
    }

    /// One rate-limited request plus response normalization
    async fn attempt(&self, url: &str) -> Result<Vec<BarRecord>> {
        self.limiter.acquire().await;

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamAuth(format!(
                "Provider access error {}: {}",
                status,
                truncate(&body, 400)
            )));
        }
        if status == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamBadRequest(format!(
                "Provider 400 Bad Request: {}",
                truncate(&body, 600)
            )));
        }
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "Provider returned status {}",
                status
            )));
        }

        let payload: AggsResponse = response.json().await?;

        let mut bars = Vec::new();
        for row in payload.results.unwrap_or_default() {
            let ts: DateTime<Utc> = DateTime::from_timestamp_millis(row.t).ok_or_else(|| {
                AppError::Upstream(format!("Provider sent unrepresentable bar timestamp {}", row.t))
            })?;
            bars.push(BarRecord {
                ts,
                open: row.o,
                high: row.h,
                low: row.l,
                close: row.c,
                volume: row.v,
            });
        }
        Ok(bars)
    }
}

/// Auth and malformed-request responses are final; retrying cannot help
fn is_fatal(err: &AppError) -> bool {
    matches!(
        err,
        AppError::UpstreamAuth(_) | AppError::UpstreamBadRequest(_)
    )
}

#[async_trait]
impl BarsProvider for MassiveClient {
    async fn fetch_bars(
        &self,
        ticker: &str,
        date_from: &str,
        date_to: &str,
        multiplier: u32,
        timespan: &str,
    ) -> Result<Vec<BarRecord>> {
        self.require_key()?;

        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Ok(Vec::new());
        }

        // Validate and clamp before spending a call.
        let from = parse_date(date_from, "date_from")?;
        let to = parse_date(date_to, "date_to")?;

        if from > to {
            return Ok(Vec::new());
        }
        if to < HISTORY_FLOOR {
            return Ok(Vec::new());
        }
        let from = from.max(HISTORY_FLOOR);

        let url = self.agg_url(&ticker, multiplier, timespan, from, to);

        let mut last_err = None;
        for attempt in 1..=self.max_retries {
            match self.attempt(&url).await {
                Ok(bars) => {
                    debug!("Fetched {} bars for {} [{}..{}]", bars.len(), ticker, from, to);
                    return Ok(bars);
                }
                Err(err) if is_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(
                        "Bar fetch attempt {}/{} for {} failed: {}",
                        attempt, self.max_retries, ticker, err
                    );
                    last_err = Some(err);
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.backoff_base * attempt).await;
                    }
                }
            }
        }

        let cause = last_err.map(|e| e.to_string()).unwrap_or_default();
        Err(AppError::Upstream(format!("Provider fetch failed: {}", cause)))
    }
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::UpstreamBadRequest(format!("{} must be YYYY-MM-DD", field)))
}

fn truncate(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
