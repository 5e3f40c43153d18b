//! Library for keyword event-rate monitoring
//!
//! This crate provides the core functionality for:
//! - Paginated ingestion of keyword events from a search API
//! - Durable, idempotent event storage
//! - Dispersion-based anomaly detection with notification cooldown
//! - Best-effort multi-subscriber notification delivery
//! - Metrics and structured logging

pub mod anomaly;
pub mod fetch;
pub mod models;
pub mod notify;
pub mod observability;
pub mod store;

pub use anomaly::{AnomalyDetector, DetectionOutcome, DetectorConfig};
pub use fetch::{IngestConfig, IngestStats, Ingestor, SearchClient, SearchConfig};
pub use models::{AlertMessage, Event};
pub use notify::{FanoutNotifier, Notifier, TracingNotifier, WebhookNotifier};
pub use observability::{SentinelMetrics, StructuredLogger};
pub use store::{
    CheckpointStore, EventStore, FileCheckpointStore, FileEventStore, MemoryCheckpointStore,
    MemoryEventStore,
};
