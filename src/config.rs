//! Application configuration
//!
//! Policy constants and provider settings. Everything here is overridable
//! through environment variables so that deployment-specific limits (provider
//! plan, rate quota) never live in code.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration shared by all services and providers
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the SQLite database file
    pub data_dir: PathBuf,

    /// Upstream bar data is delayed; never request newer than today - delay
    pub provider_delay_days: i64,

    /// Maximum lookback window the upstream plan allows, in days
    pub max_history_days: i64,

    /// Default lookback when a confirm request omits the start date, in days
    pub default_history_days: i64,

    /// Cap on points returned by a close-series query
    pub max_close_points: usize,

    /// Shared provider-call quota, calls per minute
    pub calls_per_minute: u32,

    /// Over-fetch factor when reading cached news before deduplication
    pub news_overfetch_multiplier: usize,

    /// Attempts for a bar fetch before surfacing an upstream error
    pub bar_fetch_retries: u32,

    /// Backoff between bar fetch attempts grows linearly from this base
    pub retry_backoff_base: Duration,

    /// Timeout for a single bars request
    pub bars_timeout: Duration,

    /// Timeout for a single quote/profile/news request
    pub quote_timeout: Duration,

    /// Polygon-compatible aggregates API
    pub massive_base_url: String,
    pub massive_api_key: String,

    /// Quote and company profile API
    pub finnhub_base_url: String,
    pub finnhub_api_key: String,

    /// News headline API
    pub gdelt_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            provider_delay_days: 3,
            max_history_days: 730,
            default_history_days: 365,
            max_close_points: 20_000,
            calls_per_minute: 5,
            news_overfetch_multiplier: 3,
            bar_fetch_retries: 3,
            retry_backoff_base: Duration::from_millis(800),
            bars_timeout: Duration::from_secs(25),
            quote_timeout: Duration::from_secs(10),
            massive_base_url: "https://api.polygon.io".to_string(),
            massive_api_key: String::new(),
            finnhub_base_url: "https://finnhub.io/api/v1".to_string(),
            finnhub_api_key: String::new(),
            gdelt_base_url: "https://api.gdeltproject.org/api/v2".to_string(),
        }
    }
}

impl AppConfig {
    /// Build a config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("TICKERCACHE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(v) = env_parse("TICKERCACHE_PROVIDER_DELAY_DAYS") {
            config.provider_delay_days = v;
        }
        if let Some(v) = env_parse("TICKERCACHE_MAX_HISTORY_DAYS") {
            config.max_history_days = v;
        }
        if let Some(v) = env_parse("TICKERCACHE_DEFAULT_HISTORY_DAYS") {
            config.default_history_days = v;
        }
        if let Some(v) = env_parse("TICKERCACHE_MAX_CLOSE_POINTS") {
            config.max_close_points = v;
        }
        if let Some(v) = env_parse("TICKERCACHE_CALLS_PER_MINUTE") {
            config.calls_per_minute = v;
        }
        if let Some(v) = env_parse("TICKERCACHE_BAR_FETCH_RETRIES") {
            config.bar_fetch_retries = v;
        }
        if let Some(ms) = env_parse::<u64>("TICKERCACHE_RETRY_BACKOFF_MS") {
            config.retry_backoff_base = Duration::from_millis(ms);
        }
        if let Some(v) = env_parse("TICKERCACHE_NEWS_OVERFETCH_MULTIPLIER") {
            config.news_overfetch_multiplier = v;
        }
        if let Some(secs) = env_parse::<u64>("TICKERCACHE_BARS_TIMEOUT_SECS") {
            config.bars_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("TICKERCACHE_QUOTE_TIMEOUT_SECS") {
            config.quote_timeout = Duration::from_secs(secs);
        }
        if let Ok(url) = env::var("MASSIVE_BASE_URL") {
            config.massive_base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(key) = env::var("MASSIVE_API_KEY") {
            config.massive_api_key = key.trim().to_string();
        }
        if let Ok(key) = env::var("FINNHUB_API_KEY") {
            config.finnhub_api_key = key.trim().to_string();
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy() {
        let config = AppConfig::default();
        assert_eq!(config.provider_delay_days, 3);
        assert_eq!(config.max_history_days, 730);
        assert_eq!(config.max_close_points, 20_000);
        assert_eq!(config.calls_per_minute, 5);
        assert_eq!(config.news_overfetch_multiplier, 3);
        assert_eq!(config.bar_fetch_retries, 3);
        assert_eq!(config.retry_backoff_base, Duration::from_millis(800));
    }

    #[test]
    fn test_env_overrides_news_and_timeouts() {
        env::set_var("TICKERCACHE_NEWS_OVERFETCH_MULTIPLIER", "5");
        env::set_var("TICKERCACHE_BARS_TIMEOUT_SECS", "40");
        env::set_var("TICKERCACHE_QUOTE_TIMEOUT_SECS", "7");

        let config = AppConfig::from_env();
        assert_eq!(config.news_overfetch_multiplier, 5);
        assert_eq!(config.bars_timeout, Duration::from_secs(40));
        assert_eq!(config.quote_timeout, Duration::from_secs(7));

        env::remove_var("TICKERCACHE_NEWS_OVERFETCH_MULTIPLIER");
        env::remove_var("TICKERCACHE_BARS_TIMEOUT_SECS");
        env::remove_var("TICKERCACHE_QUOTE_TIMEOUT_SECS");
    }
}
