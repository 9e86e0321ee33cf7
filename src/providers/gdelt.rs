//! GDELT news headline client
//!
//! Queries the GDELT DOC 2.0 article list for one calendar day. Matching uses
//! a cashtag-style ticker phrase plus the company name when known; without a
//! company name it degrades to the ticker pattern only.

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::providers::types::Headline;
use crate::providers::NewsProvider;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

/// GDELT DOC API client
pub struct GdeltClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ArtListResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Deserialize)]
struct Article {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    domain: Option<String>,
    /// e.g. "20240105T133000Z"
    seendate: Option<String>,
}

impl GdeltClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.quote_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.gdelt_base_url.clone(),
        })
    }

    fn build_query(ticker: &str, company_name: Option<&str>) -> String {
        let ticker = ticker.trim().to_uppercase();
        // Cashtag form avoids matching ordinary English words ("SPY").
        let mut query = format!("\"${}\"", ticker);
        if let Some(name) = company_name.map(str::trim).filter(|n| !n.is_empty()) {
            query = format!("({} OR \"{}\")", query, name);
        }
        query.push_str(" sourcelang:english");
        query
    }
}

#[async_trait]
impl NewsProvider for GdeltClient {
    async fn get_headlines(
        &self,
        ticker: &str,
        company_name: Option<&str>,
        day: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Headline>> {
        let query = Self::build_query(ticker, company_name);
        let day_compact = day.format("%Y%m%d");
        let url = format!(
            "{}/doc/doc?query={}&mode=artlist&format=json&maxrecords={}&startdatetime={}000000&enddatetime={}235959&sort=datedesc",
            self.base_url,
            urlencoding::encode(&query),
            limit,
            day_compact,
            day_compact,
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "News provider returned status {}",
                status
            )));
        }

        let payload: ArtListResponse = response.json().await?;

        let headlines = payload
            .articles
            .into_iter()
            .map(|a| Headline {
                title: a.title.trim().to_string(),
                url: a.url.trim().to_string(),
                domain: a
                    .domain
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
                published_at: a.seendate.as_deref().and_then(parse_seendate),
            })
            .collect();

        Ok(headlines)
    }
}

fn parse_seendate(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), "%Y%m%dT%H%M%SZ")
        .ok()
        .map(|dt| dt.and_utc())
}
