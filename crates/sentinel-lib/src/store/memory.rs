//! In-memory store implementations

use super::{async_trait, CheckpointStore, EventStore};
use crate::models::Event;
use anyhow::Result;
use dashmap::DashMap;
use tokio::sync::Mutex;

/// Event store held entirely in memory
///
/// Useful for tests and for embedders that bring their own persistence.
#[derive(Default)]
pub struct MemoryEventStore {
    events: DashMap<String, i64>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct event ids currently stored
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn upsert(&self, id: &str, created_at: i64) -> Result<()> {
        self.events.insert(id.to_string(), created_at);
        Ok(())
    }

    async fn scan(&self, min: i64, max: i64) -> Result<Vec<Event>> {
        Ok(self
            .events
            .iter()
            .filter(|entry| min <= *entry.value() && *entry.value() <= max)
            .map(|entry| Event::new(entry.key().clone(), *entry.value()))
            .collect())
    }
}

/// Checkpoint store held in memory
///
/// The mutex makes `compare_and_write` atomic across concurrent callers.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    value: Mutex<i64>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: i64) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn read(&self) -> Result<i64> {
        Ok(*self.value.lock().await)
    }

    async fn write(&self, value: i64) -> Result<()> {
        *self.value.lock().await = value;
        Ok(())
    }

    async fn compare_and_write(&self, expected: i64, value: i64) -> Result<bool> {
        let mut current = self.value.lock().await;
        if *current != expected {
            return Ok(false);
        }
        *current = value;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryEventStore::new();

        store.upsert("event-1", 1000).await.unwrap();
        store.upsert("event-1", 1000).await.unwrap();

        assert_eq!(store.len(), 1);
        let events = store.scan(0, 2000).await.unwrap();
        assert_eq!(events, vec![Event::new("event-1", 1000)]);
    }

    #[tokio::test]
    async fn test_scan_range_is_inclusive() {
        let store = MemoryEventStore::new();
        store.upsert("low", 100).await.unwrap();
        store.upsert("mid", 150).await.unwrap();
        store.upsert("high", 200).await.unwrap();
        store.upsert("outside", 201).await.unwrap();

        let mut events = store.scan(100, 200).await.unwrap();
        events.sort_by_key(|e| e.created_at);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].id, "low");
        assert_eq!(events[2].id, "high");
    }

    #[tokio::test]
    async fn test_checkpoint_defaults_to_zero() {
        let store = MemoryCheckpointStore::new();
        assert_eq!(store.read().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_compare_and_write_rejects_stale_expected() {
        let store = MemoryCheckpointStore::with_value(500);

        assert!(!store.compare_and_write(400, 600).await.unwrap());
        assert_eq!(store.read().await.unwrap(), 500);

        assert!(store.compare_and_write(500, 600).await.unwrap());
        assert_eq!(store.read().await.unwrap(), 600);
    }
}
