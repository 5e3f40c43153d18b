//! Durable state backing the fetcher and the detector
//!
//! Two small contracts cover everything the core persists:
//! - an event store keyed by event id, written with idempotent upserts
//! - a checkpoint store holding the single last-notified timestamp
//!
//! In-memory implementations back tests and embedders; the file-backed
//! implementations persist JSON with atomic temp-file renames.

mod file;
mod memory;

pub use file::{FileCheckpointStore, FileEventStore};
pub use memory::{MemoryCheckpointStore, MemoryEventStore};

use crate::models::Event;
use anyhow::Result;

pub use async_trait::async_trait;

/// Keyed store of observed events
///
/// Writes are idempotent upserts: concurrent or repeated writes of the same
/// id never corrupt the store, they only overwrite identical data.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert or overwrite the record for `id`
    async fn upsert(&self, id: &str, created_at: i64) -> Result<()>;

    /// Return all events with `created_at` in `[min, max]`, both ends inclusive
    async fn scan(&self, min: i64, max: i64) -> Result<Vec<Event>>;

    /// Persist buffered writes, if the implementation buffers at all
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Store for the last-notified timestamp
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Read the current checkpoint; 0 when none has ever been written
    async fn read(&self) -> Result<i64>;

    /// Overwrite the checkpoint unconditionally
    async fn write(&self, value: i64) -> Result<()>;

    /// Write `value` only if the current checkpoint still equals `expected`
    ///
    /// Returns false when another writer got there first. This is the gate
    /// that keeps two concurrent detector runs from both passing the
    /// cooldown check against the same store handle.
    async fn compare_and_write(&self, expected: i64, value: i64) -> Result<bool>;
}
