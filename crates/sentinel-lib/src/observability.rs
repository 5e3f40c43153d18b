//! Observability infrastructure for the sentinel
//!
//! Provides:
//! - Prometheus metrics (ingestion volume, detector activity, search latency)
//! - Structured logging helpers for run-level events

use crate::anomaly::DetectionOutcome;
use crate::fetch::IngestStats;
use prometheus::{register_histogram, register_int_counter, Histogram, IntCounter};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for search request latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SentinelMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct SentinelMetricsInner {
    pages_fetched: IntCounter,
    events_stored: IntCounter,
    events_skipped: IntCounter,
    fetch_errors: IntCounter,
    detector_runs: IntCounter,
    anomalies_detected: IntCounter,
    notifications_published: IntCounter,
    notifications_suppressed: IntCounter,
    search_latency_seconds: Histogram,
}

impl SentinelMetricsInner {
    fn new() -> Self {
        Self {
            pages_fetched: register_int_counter!(
                "sentinel_pages_fetched_total",
                "Search API pages fetched"
            )
            .expect("Failed to register pages_fetched_total"),

            events_stored: register_int_counter!(
                "sentinel_events_stored_total",
                "Events upserted into the durable store"
            )
            .expect("Failed to register events_stored_total"),

            events_skipped: register_int_counter!(
                "sentinel_events_skipped_total",
                "Events dropped for malformed timestamps"
            )
            .expect("Failed to register events_skipped_total"),

            fetch_errors: register_int_counter!(
                "sentinel_fetch_errors_total",
                "Ingestion runs aborted by a search API error"
            )
            .expect("Failed to register fetch_errors_total"),

            detector_runs: register_int_counter!(
                "sentinel_detector_runs_total",
                "Detection passes executed"
            )
            .expect("Failed to register detector_runs_total"),

            anomalies_detected: register_int_counter!(
                "sentinel_anomalies_detected_total",
                "Detection passes whose dispersion crossed the threshold"
            )
            .expect("Failed to register anomalies_detected_total"),

            notifications_published: register_int_counter!(
                "sentinel_notifications_published_total",
                "Alerts published to the notification channel"
            )
            .expect("Failed to register notifications_published_total"),

            notifications_suppressed: register_int_counter!(
                "sentinel_notifications_suppressed_total",
                "Anomalies held back by the cooldown gate"
            )
            .expect("Failed to register notifications_suppressed_total"),

            search_latency_seconds: register_histogram!(
                "sentinel_search_latency_seconds",
                "Time spent on a single search API request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register search_latency_seconds"),
        }
    }
}

/// Sentinel metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct SentinelMetrics {
    _private: (),
}

impl Default for SentinelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SentinelMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SentinelMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SentinelMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_pages_fetched(&self) {
        self.inner().pages_fetched.inc();
    }

    pub fn inc_events_stored(&self) {
        self.inner().events_stored.inc();
    }

    pub fn inc_events_skipped(&self) {
        self.inner().events_skipped.inc();
    }

    pub fn inc_fetch_errors(&self) {
        self.inner().fetch_errors.inc();
    }

    pub fn inc_detector_runs(&self) {
        self.inner().detector_runs.inc();
    }

    pub fn inc_anomalies_detected(&self) {
        self.inner().anomalies_detected.inc();
    }

    pub fn inc_notifications_published(&self) {
        self.inner().notifications_published.inc();
    }

    pub fn inc_notifications_suppressed(&self) {
        self.inner().notifications_suppressed.inc();
    }

    /// Record one search request latency observation
    pub fn observe_search_latency(&self, duration_secs: f64) {
        self.inner().search_latency_seconds.observe(duration_secs);
    }
}

/// Structured logger for run-level sentinel events
#[derive(Clone)]
pub struct StructuredLogger {
    keyword: String,
}

impl StructuredLogger {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str) {
        info!(
            event = "startup",
            keyword = %self.keyword,
            version = %version,
            "Sentinel starting"
        );
    }

    /// Log the outcome of an ingestion run
    pub fn log_ingest_complete(&self, stats: &IngestStats) {
        info!(
            event = "ingest_complete",
            keyword = %self.keyword,
            pages = stats.pages,
            stored = stats.stored,
            skipped = stats.skipped,
            "Ingestion run complete"
        );
    }

    /// Log the outcome of a detection pass
    pub fn log_detection_outcome(&self, outcome: &DetectionOutcome) {
        match outcome {
            DetectionOutcome::TooFewBins { bins } => {
                info!(
                    event = "detection_complete",
                    keyword = %self.keyword,
                    outcome = "too_few_bins",
                    bins = bins,
                    "Window too narrow to evaluate"
                );
            }
            DetectionOutcome::Normal { std_dev, .. } => {
                info!(
                    event = "detection_complete",
                    keyword = %self.keyword,
                    outcome = "normal",
                    std_dev = std_dev,
                    "Event rate within boundaries"
                );
            }
            DetectionOutcome::Suppressed {
                std_dev, last_sent, ..
            } => {
                info!(
                    event = "detection_complete",
                    keyword = %self.keyword,
                    outcome = "suppressed",
                    std_dev = std_dev,
                    last_sent = last_sent,
                    "Anomaly detected but notification suppressed"
                );
            }
            DetectionOutcome::Notified { std_dev, .. } => {
                warn!(
                    event = "detection_complete",
                    keyword = %self.keyword,
                    outcome = "notified",
                    std_dev = std_dev,
                    "Anomaly detected, notification published"
                );
            }
        }
    }
}
