//! JSON-file store implementations
//!
//! Both stores keep their working state in memory and persist the whole
//! document on flush, writing to a temp file and renaming so readers never
//! observe a partial write. A file that fails to parse on open is logged and
//! treated as empty rather than aborting the run.

use super::{async_trait, CheckpointStore, EventStore};
use crate::models::Event;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Event store persisted as a JSON map of id to creation timestamp
pub struct FileEventStore {
    path: PathBuf,
    state: Mutex<FileEventState>,
}

struct FileEventState {
    events: HashMap<String, i64>,
    dirty: bool,
}

impl FileEventStore {
    /// Open the store at `path`, loading any existing contents
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let events = if path.exists() {
            match load_json::<HashMap<String, i64>>(&path) {
                Ok(events) => {
                    info!(path = %path.display(), entries = events.len(), "Loaded event store");
                    events
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load event store, starting fresh");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            state: Mutex::new(FileEventState {
                events,
                dirty: false,
            }),
        })
    }
}

#[async_trait]
impl EventStore for FileEventStore {
    async fn upsert(&self, id: &str, created_at: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        state.events.insert(id.to_string(), created_at);
        state.dirty = true;
        Ok(())
    }

    async fn scan(&self, min: i64, max: i64) -> Result<Vec<Event>> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .filter(|(_, &created_at)| min <= created_at && created_at <= max)
            .map(|(id, &created_at)| Event::new(id.clone(), created_at))
            .collect())
    }

    async fn flush(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.dirty {
            return Ok(());
        }

        save_json(&self.path, &state.events)?;
        state.dirty = false;
        debug!(path = %self.path.display(), entries = state.events.len(), "Event store flushed to disk");
        Ok(())
    }
}

/// Checkpoint store persisted as a single JSON integer
///
/// `compare_and_write` is atomic for every caller sharing this store handle;
/// callers in separate processes need a backend with conditional writes.
pub struct FileCheckpointStore {
    path: PathBuf,
    value: Mutex<i64>,
}

impl FileCheckpointStore {
    /// Open the store at `path`; a missing or unreadable file reads as 0
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let value = if path.exists() {
            match load_json::<i64>(&path) {
                Ok(value) => value,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load checkpoint, starting at 0");
                    0
                }
            }
        } else {
            0
        };

        Ok(Self {
            path,
            value: Mutex::new(value),
        })
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn read(&self) -> Result<i64> {
        Ok(*self.value.lock().await)
    }

    async fn write(&self, value: i64) -> Result<()> {
        let mut current = self.value.lock().await;
        save_json(&self.path, &value)?;
        *current = value;
        Ok(())
    }

    async fn compare_and_write(&self, expected: i64, value: i64) -> Result<bool> {
        let mut current = self.value.lock().await;
        if *current != expected {
            return Ok(false);
        }
        save_json(&self.path, &value)?;
        *current = value;
        Ok(true)
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_slice(&data).with_context(|| format!("Failed to parse {:?}", path))
}

fn save_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let json = serde_json::to_vec(value).context("Failed to serialize store contents")?;

    // Write atomically using temp file
    let temp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;

    file.write_all(&json).context("Failed to write store data")?;
    file.sync_all().context("Failed to sync store file")?;

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        {
            let store = FileEventStore::open(&path).unwrap();
            store.upsert("event-1", 1000).await.unwrap();
            store.upsert("event-2", 2000).await.unwrap();
            store.flush().await.unwrap();
        }

        let store = FileEventStore::open(&path).unwrap();
        let mut events = store.scan(0, 3000).await.unwrap();
        events.sort_by_key(|e| e.created_at);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Event::new("event-1", 1000));
        assert_eq!(events[1], Event::new("event-2", 2000));
    }

    #[tokio::test]
    async fn test_event_store_upsert_overwrites_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        {
            let store = FileEventStore::open(&path).unwrap();
            store.upsert("event-1", 1000).await.unwrap();
            store.upsert("event-1", 1000).await.unwrap();
            store.flush().await.unwrap();
        }

        let store = FileEventStore::open(&path).unwrap();
        assert_eq!(store.scan(0, 2000).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_event_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = FileEventStore::open(&path).unwrap();
        assert!(store.scan(i64::MIN, i64::MAX).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_checkpoint_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::open(dir.path().join("checkpoint.json")).unwrap();
        assert_eq!(store.read().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_checkpoint_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        {
            let store = FileCheckpointStore::open(&path).unwrap();
            store.write(1_700_000_000).await.unwrap();
        }

        let store = FileCheckpointStore::open(&path).unwrap();
        assert_eq!(store.read().await.unwrap(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_checkpoint_compare_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::open(dir.path().join("checkpoint.json")).unwrap();

        assert!(store.compare_and_write(0, 100).await.unwrap());
        assert!(!store.compare_and_write(0, 200).await.unwrap());
        assert_eq!(store.read().await.unwrap(), 100);
    }
}
