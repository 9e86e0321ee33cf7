//! Finnhub quote and company profile client

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::providers::types::{CompanyProfile, QuoteSnapshot};
use crate::providers::{ProfileProvider, QuoteProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Finnhub API client, serving both quotes and profiles
pub struct FinnhubClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    o: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    pc: Option<f64>,
    /// Quote time, Unix seconds; 0 when unavailable
    t: Option<i64>,
}

#[derive(Deserialize, Default)]
struct ProfileResponse {
    name: Option<String>,
    exchange: Option<String>,
    country: Option<String>,
    currency: Option<String>,
    mic: Option<String>,
    #[serde(rename = "type")]
    instrument_type: Option<String>,
}

impl FinnhubClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.quote_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.finnhub_base_url.clone(),
            api_key: config.finnhub_api_key.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        ticker: &str,
    ) -> Result<T> {
        if self.api_key.is_empty() {
            return Err(AppError::Config(
                "FINNHUB_API_KEY is missing. Set it in the environment.".to_string(),
            ));
        }

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&[("symbol", ticker), ("token", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::UpstreamAuth(format!(
                "Quote provider access error {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "Quote provider returned status {}",
                status
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    async fn fetch_quote(&self, ticker: &str) -> Result<QuoteSnapshot> {
        let ticker = ticker.trim().to_uppercase();
        let data: QuoteResponse = self.get_json("/quote", &ticker).await?;

        let price = data.c.ok_or_else(|| {
            AppError::Upstream(format!("Quote response for {} had no price", ticker))
        })?;

        // t == 0 means the provider had no timestamp; fall back to fetch time.
        let quote_ts = match data.t {
            Some(secs) if secs > 0 => DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| AppError::Upstream(format!("Bad quote timestamp {}", secs)))?,
            _ => Utc::now(),
        };

        Ok(QuoteSnapshot {
            price,
            open: data.o,
            high: data.h,
            low: data.l,
            prev_close: data.pc,
            quote_ts,
        })
    }
}

#[async_trait]
impl ProfileProvider for FinnhubClient {
    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile> {
        let ticker = ticker.trim().to_uppercase();
        let data: ProfileResponse = self.get_json("/stock/profile2", &ticker).await?;

        Ok(CompanyProfile {
            name: clean(data.name),
            exchange: clean(data.exchange),
            country: clean(data.country),
            currency: clean(data.currency),
            mic: clean(data.mic),
            instrument_type: clean(data.instrument_type),
        })
    }
}

/// Trim a provider string field, treating empty as absent
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_drops_blank_fields() {
        assert_eq!(clean(Some("  Apple Inc  ".into())), Some("Apple Inc".to_string()));
        assert_eq!(clean(Some("   ".into())), None);
        assert_eq!(clean(None), None);
    }

    #[test]
    fn test_quote_response_tolerates_missing_fields() {
        let data: QuoteResponse = serde_json::from_str(r#"{"c": 187.5}"#).unwrap();
        assert_eq!(data.c, Some(187.5));
        assert!(data.o.is_none());
        assert!(data.t.is_none());
    }

    #[test]
    fn test_profile_response_renames_type() {
        let data: ProfileResponse =
            serde_json::from_str(r#"{"name": "Apple Inc", "type": "Common Stock"}"#).unwrap();
        assert_eq!(data.instrument_type.as_deref(), Some("Common Stock"));
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let client = FinnhubClient::new(&AppConfig::default()).unwrap();
        let err = client.fetch_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
