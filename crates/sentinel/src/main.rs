//! Hashtag Sentinel - keyword event-rate monitor
//!
//! One invocation ingests recent events matching the configured keyword and
//! then runs a detection pass over the stored window. An external scheduler
//! owns the cadence; the binary holds no state between invocations beyond
//! the event store and the notification checkpoint.

use anyhow::Result;
use sentinel_lib::{
    AnomalyDetector, DetectorConfig, FanoutNotifier, FileCheckpointStore, FileEventStore,
    IngestConfig, Ingestor, SearchClient, SearchConfig, StructuredLogger, TracingNotifier,
    WebhookNotifier,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const SENTINEL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::SentinelConfig::load()?;
    let logger = StructuredLogger::new(&config.keyword);
    logger.log_startup(SENTINEL_VERSION);

    let event_store = Arc::new(FileEventStore::open(&config.events_path)?);
    let checkpoint_store = Arc::new(FileCheckpointStore::open(&config.checkpoint_path)?);

    let client = SearchClient::new(SearchConfig {
        endpoint: config.search_endpoint.clone(),
        bearer_token: config.bearer_token.clone(),
        timeout: Duration::from_secs(30),
    })?;

    let mut ingest_config = IngestConfig::new(&config.keyword);
    ingest_config.lookback_hours = config.lookback_hours;
    ingest_config.page_size = config.page_size;

    let ingestor = Ingestor::new(client, event_store.clone(), ingest_config);
    match ingestor.run().await {
        Ok(stats) => logger.log_ingest_complete(&stats),
        // Detection still runs: the store holds whatever previous runs
        // ingested, and the next scheduled run retries the fetch.
        Err(e) => error!(error = %e, "Ingestion run failed"),
    }

    let mut fanout = FanoutNotifier::new().subscribe(Arc::new(TracingNotifier::new()));
    if let Some(url) = &config.webhook_url {
        fanout = fanout.subscribe(Arc::new(WebhookNotifier::new(url)?));
    }

    let mut detector_config = DetectorConfig::new(&config.keyword);
    detector_config.window_hours = config.window_hours;
    detector_config.bin_seconds = config.bin_seconds;
    detector_config.std_dev_threshold = config.std_dev_threshold;
    detector_config.cooldown_hours = config.cooldown_hours;

    let detector = AnomalyDetector::new(
        event_store,
        checkpoint_store,
        Arc::new(fanout),
        detector_config,
    );

    let outcome = detector.run().await?;
    logger.log_detection_outcome(&outcome);

    info!("Run complete");
    Ok(())
}
