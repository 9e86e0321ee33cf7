//! Provider adapters module
//!
//! Each upstream API is reached through a trait so that services stay
//! provider-agnostic and tests can substitute mocks. All outbound calls that
//! count against the shared quota go through [`rate_limit::RateLimiter`].

pub mod types;
pub mod rate_limit;
pub mod massive;
pub mod finnhub;
pub mod gdelt;

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use types::*;

pub use rate_limit::RateLimiter;

/// Daily bar history source
#[async_trait]
pub trait BarsProvider: Send + Sync {
    /// Fetch OHLCV aggregates for an inclusive ISO date range.
    ///
    /// Returns an empty vector for an empty range (start > end) or a range
    /// that lies entirely before the provider's historical floor.
    async fn fetch_bars(
        &self,
        ticker: &str,
        date_from: &str,
        date_to: &str,
        multiplier: u32,
        timespan: &str,
    ) -> Result<Vec<BarRecord>>;
}

/// Point-in-time quote source
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, ticker: &str) -> Result<QuoteSnapshot>;
}

/// Company profile source
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile>;
}

/// News headline source
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Fetch up to `limit` headlines for one calendar day. Without a company
    /// name, matching degrades to the ticker pattern only.
    async fn get_headlines(
        &self,
        ticker: &str,
        company_name: Option<&str>,
        day: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Headline>>;
}
