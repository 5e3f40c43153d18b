//! Event ingestion from the remote search API
//!
//! This module provides:
//! - an HTTP search client with bearer authentication and typed responses
//! - the paginated ingestor that walks a lookback window and upserts every
//!   matching event into the durable store

mod client;
mod ingest;


pub use client::{SearchClient, SearchConfig, SearchError, SearchItem, SearchMeta, SearchPage};
pub use ingest::{IngestConfig, IngestStats, Ingestor, MAX_PAGE_SIZE};
