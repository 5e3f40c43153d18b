//! HTTP client for the recent-search API

use crate::observability::SentinelMetrics;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Configuration for the search client
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Search endpoint URL
    pub endpoint: String,
    /// Bearer token for the Authorization header
    pub bearer_token: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.twitter.com/2/tweets/search/recent".to_string(),
            bearer_token: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Errors from a single search request
#[derive(Debug, Error)]
pub enum SearchError {
    /// The API answered with a non-success status; payload preserved
    #[error("search API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid search endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// One page of search results
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    /// Matching events; absent upstream when the page is empty
    #[serde(default)]
    pub data: Vec<SearchItem>,
    pub meta: SearchMeta,
}

/// A single search result
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub id: String,
    /// Creation time as an RFC 3339 string
    pub created_at: String,
}

/// Pagination metadata attached to every page
#[derive(Debug, Clone, Deserialize)]
pub struct SearchMeta {
    pub result_count: u64,
    /// Continuation cursor; absent on the final page
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Client for the paginated recent-search API
pub struct SearchClient {
    client: Client,
    endpoint: Url,
    bearer_token: String,
    metrics: SentinelMetrics,
}

impl SearchClient {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let endpoint = Url::parse(&config.endpoint)?;

        Ok(Self {
            client,
            endpoint,
            bearer_token: config.bearer_token,
            metrics: SentinelMetrics::new(),
        })
    }

    /// Fetch one page of results
    ///
    /// The first request of a run carries `start_time`; follow-up requests
    /// carry the cursor from the previous page instead.
    pub async fn search(
        &self,
        query: &str,
        max_results: u32,
        start_time: Option<DateTime<Utc>>,
        cursor: Option<&str>,
    ) -> Result<SearchPage, SearchError> {
        let mut params: Vec<(&str, String)> = vec![
            ("query", query.to_string()),
            ("max_results", max_results.to_string()),
            ("tweet.fields", "created_at".to_string()),
        ];

        match cursor {
            Some(token) => params.push(("next_token", token.to_string())),
            None => {
                if let Some(start) = start_time {
                    params.push(("start_time", start.to_rfc3339()));
                }
            }
        }

        let started = Instant::now();
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&params)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        self.metrics
            .observe_search_latency(started.elapsed().as_secs_f64());

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let page: SearchPage = response.json().await?;
        debug!(
            results = page.meta.result_count,
            has_next = page.meta.next_token.is_some(),
            "Fetched search page"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_config_default() {
        let config = SearchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.endpoint.starts_with("https://"));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let config = SearchConfig {
            endpoint: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            SearchClient::new(config),
            Err(SearchError::Endpoint(_))
        ));
    }

    #[test]
    fn test_empty_page_deserializes_without_data() {
        let page: SearchPage = serde_json::from_str(r#"{"meta":{"result_count":0}}"#).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.meta.result_count, 0);
        assert!(page.meta.next_token.is_none());
    }
}
