//! Paginated ingestion of keyword events into the durable store

use super::client::SearchClient;
use crate::observability::SentinelMetrics;
use crate::store::EventStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upstream cap on results per page
pub const MAX_PAGE_SIZE: u32 = 100;

/// Configuration for one ingestion run
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Keyword the search matches
    pub keyword: String,
    /// Lookback window in hours
    pub lookback_hours: u64,
    /// Requested results per page, capped at [`MAX_PAGE_SIZE`]
    pub page_size: u32,
}

impl IngestConfig {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            lookback_hours: 1,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Page size after applying the upstream cap
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.min(MAX_PAGE_SIZE)
    }
}

/// Results from one ingestion run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    /// Pages fetched from the API
    pub pages: u64,
    /// Events upserted into the store
    pub stored: u64,
    /// Events dropped for malformed timestamps
    pub skipped: u64,
}

/// Pages through the search API and upserts every matching event
///
/// There is no fetch checkpoint: every run re-queries the full lookback
/// window and relies on upsert idempotence to absorb events seen before.
pub struct Ingestor {
    client: SearchClient,
    store: Arc<dyn EventStore>,
    config: IngestConfig,
    metrics: SentinelMetrics,
}

impl Ingestor {
    pub fn new(client: SearchClient, store: Arc<dyn EventStore>, config: IngestConfig) -> Self {
        Self {
            client,
            store,
            config,
            metrics: SentinelMetrics::new(),
        }
    }

    /// Ingest everything created within the configured lookback window
    pub async fn run(&self) -> Result<IngestStats> {
        let start_time = Utc::now() - Duration::hours(self.config.lookback_hours as i64);
        self.run_from(start_time).await
    }

    /// Ingest everything created on or after `start_time`
    pub async fn run_from(&self, start_time: DateTime<Utc>) -> Result<IngestStats> {
        let mut stats = IngestStats::default();
        let mut cursor: Option<String> = None;
        let page_size = self.config.effective_page_size();

        loop {
            let mut page = match self
                .client
                .search(
                    &self.config.keyword,
                    page_size,
                    cursor.is_none().then_some(start_time),
                    cursor.as_deref(),
                )
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    self.metrics.inc_fetch_errors();
                    return Err(e).context("aborting ingestion run");
                }
            };

            stats.pages += 1;
            self.metrics.inc_pages_fetched();

            if page.meta.result_count == 0 {
                debug!(keyword = %self.config.keyword, "Search returned no results");
                break;
            }

            for item in &page.data {
                match DateTime::parse_from_rfc3339(&item.created_at) {
                    Ok(created_at) => {
                        self.store.upsert(&item.id, created_at.timestamp()).await?;
                        stats.stored += 1;
                        self.metrics.inc_events_stored();
                    }
                    Err(e) => {
                        warn!(
                            id = %item.id,
                            created_at = %item.created_at,
                            error = %e,
                            "Skipping event with malformed timestamp"
                        );
                        stats.skipped += 1;
                        self.metrics.inc_events_skipped();
                    }
                }
            }
            self.store.flush().await?;

            match page.meta.next_token.take() {
                Some(token) => cursor = Some(token),
                None => break,
            }
        }

        info!(
            keyword = %self.config.keyword,
            pages = stats.pages,
            stored = stats.stored,
            skipped = stats.skipped,
            "Ingestion run complete"
        );
        Ok(stats)
    }
}
