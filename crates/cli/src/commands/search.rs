//! Ad-hoc keyword search against the recent-search API

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sentinel_lib::{SearchClient, SearchConfig};
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
struct EventRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Created At")]
    created_at: String,
}

/// Page through every event matching `keyword` in the lookback window and
/// print them, storing nothing
pub async fn run_search(
    api_url: &str,
    bearer_token: &str,
    keyword: &str,
    hours: u64,
    page_size: u32,
    format: OutputFormat,
) -> Result<()> {
    let client = SearchClient::new(SearchConfig {
        endpoint: api_url.to_string(),
        bearer_token: bearer_token.to_string(),
        ..Default::default()
    })
    .context("Failed to create search client")?;

    let start_time = Utc::now() - Duration::hours(hours as i64);
    let page_size = page_size.min(sentinel_lib::fetch::MAX_PAGE_SIZE);

    let mut rows = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0u64;

    loop {
        let mut page = client
            .search(
                keyword,
                page_size,
                cursor.is_none().then_some(start_time),
                cursor.as_deref(),
            )
            .await?;
        pages += 1;

        if page.meta.result_count == 0 {
            break;
        }

        for item in page.data.drain(..) {
            rows.push(EventRow {
                id: item.id,
                created_at: item.created_at,
            });
        }

        match page.meta.next_token.take() {
            Some(token) => cursor = Some(token),
            None => break,
        }
    }

    if rows.is_empty() {
        output::print_warning(&format!("No events matched \"{}\"", keyword));
        return Ok(());
    }

    output::print_info(&format!(
        "{} events matched \"{}\" across {} pages",
        rows.len(),
        keyword,
        pages
    ));
    output::print_table(&rows, format);

    Ok(())
}
