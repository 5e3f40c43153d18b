//! Offline analysis of a stored event window

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use sentinel_lib::anomaly::{bin_counts, sample_std_dev};
use sentinel_lib::store::EventStore;
use sentinel_lib::FileEventStore;
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
struct BinRow {
    #[tabled(rename = "Bin Start")]
    bin_start: String,
    #[tabled(rename = "Events")]
    events: u64,
}

/// Bin the trailing window of a stored event file and print the
/// distribution together with its dispersion; read-only
pub async fn run_analyze(
    events_path: &str,
    hours: u64,
    bin_seconds: i64,
    threshold: f64,
    format: OutputFormat,
) -> Result<()> {
    anyhow::ensure!(bin_seconds > 0, "bin width must be positive");

    let store = FileEventStore::open(events_path)
        .with_context(|| format!("Failed to open event store at {}", events_path))?;

    let end_time = Utc::now().timestamp();
    let start_time = end_time - (hours as i64) * 3600;

    let events = store.scan(start_time, end_time).await?;
    let timestamps: Vec<i64> = events.iter().map(|e| e.created_at).collect();

    let distribution = bin_counts(&timestamps, start_time, end_time, bin_seconds);
    let rows: Vec<BinRow> = distribution
        .iter()
        .enumerate()
        .map(|(i, &count)| BinRow {
            bin_start: Utc
                .timestamp_opt(start_time + (i as i64) * bin_seconds, 0)
                .single()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            events: count,
        })
        .collect();

    output::print_info(&format!(
        "{} events in the past {} hours",
        timestamps.len(),
        hours
    ));
    output::print_table(&rows, format);

    match sample_std_dev(&distribution) {
        Some(std_dev) => {
            println!(
                "Standard deviation: {} (threshold {:.2})",
                output::color_std_dev(std_dev, threshold),
                threshold
            );
        }
        None => {
            output::print_warning("Window produced fewer than two bins, dispersion undefined");
        }
    }

    Ok(())
}
