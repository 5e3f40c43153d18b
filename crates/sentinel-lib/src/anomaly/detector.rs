//! Dispersion-threshold anomaly detection with notification cooldown

use super::histogram::{bin_counts, sample_std_dev};
use crate::models::AlertMessage;
use crate::notify::Notifier;
use crate::observability::SentinelMetrics;
use crate::store::{CheckpointStore, EventStore};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Configuration for the anomaly detector
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Keyword named in the alert message
    pub keyword: String,
    /// Trailing scan window in hours
    pub window_hours: u64,
    /// Bin width in seconds
    pub bin_seconds: i64,
    /// Dispersion threshold that marks the window anomalous
    pub std_dev_threshold: f64,
    /// Minimum hours between notifications
    pub cooldown_hours: u64,
}

impl DetectorConfig {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            window_hours: 6,
            bin_seconds: 3600,
            std_dev_threshold: 100.0,
            cooldown_hours: 5,
        }
    }
}

/// What a single detector invocation concluded
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    /// The window produced fewer than two bins; dispersion is undefined
    TooFewBins { bins: usize },
    /// Dispersion under the threshold; nothing to report
    Normal { distribution: Vec<u64>, std_dev: f64 },
    /// Anomalous dispersion, but the cooldown gate held the notification
    /// back (either the last one was too recent, or a concurrent run won
    /// the checkpoint race)
    Suppressed {
        distribution: Vec<u64>,
        std_dev: f64,
        last_sent: i64,
    },
    /// A notification was published and the checkpoint advanced
    Notified { distribution: Vec<u64>, std_dev: f64 },
}

/// Scans the event store and publishes a notification when the bin-count
/// dispersion crosses the threshold
///
/// Each invocation is stateless; the only state carried between runs is the
/// last-notified checkpoint. The checkpoint advances via compare-and-swap
/// before the publish is attempted, so concurrent runs resolve to at most
/// one notification per cooldown window against the same store.
pub struct AnomalyDetector {
    store: Arc<dyn EventStore>,
    checkpoint: Arc<dyn CheckpointStore>,
    notifier: Arc<dyn Notifier>,
    config: DetectorConfig,
    metrics: SentinelMetrics,
}

impl AnomalyDetector {
    pub fn new(
        store: Arc<dyn EventStore>,
        checkpoint: Arc<dyn CheckpointStore>,
        notifier: Arc<dyn Notifier>,
        config: DetectorConfig,
    ) -> Self {
        Self {
            store,
            checkpoint,
            notifier,
            config,
            metrics: SentinelMetrics::new(),
        }
    }

    /// Run one detection pass over the trailing window ending now
    pub async fn run(&self) -> Result<DetectionOutcome> {
        self.run_at(Utc::now().timestamp()).await
    }

    /// Run one detection pass over the trailing window ending at `now`
    pub async fn run_at(&self, now: i64) -> Result<DetectionOutcome> {
        anyhow::ensure!(
            self.config.bin_seconds > 0,
            "bin width must be positive, got {}",
            self.config.bin_seconds
        );
        self.metrics.inc_detector_runs();

        let end_time = now;
        let start_time = now - (self.config.window_hours as i64) * 3600;

        let events = self.store.scan(start_time, end_time).await?;
        let timestamps: Vec<i64> = events.iter().map(|e| e.created_at).collect();
        debug!(
            start_time,
            end_time,
            events = timestamps.len(),
            "Scanned event window"
        );

        let distribution = bin_counts(&timestamps, start_time, end_time, self.config.bin_seconds);
        let Some(std_dev) = sample_std_dev(&distribution) else {
            debug!(
                bins = distribution.len(),
                "Window too narrow for a dispersion estimate, treating as normal"
            );
            return Ok(DetectionOutcome::TooFewBins {
                bins: distribution.len(),
            });
        };

        if std_dev < self.config.std_dev_threshold {
            debug!(
                std_dev,
                threshold = self.config.std_dev_threshold,
                "Dispersion within boundaries"
            );
            return Ok(DetectionOutcome::Normal {
                distribution,
                std_dev,
            });
        }

        self.metrics.inc_anomalies_detected();
        info!(
            std_dev,
            threshold = self.config.std_dev_threshold,
            distribution = ?distribution,
            "Anomalous event-rate dispersion"
        );

        let last_sent = self.checkpoint.read().await?;
        let cooldown_start = now - (self.config.cooldown_hours as i64) * 3600;
        if last_sent > cooldown_start {
            info!(last_sent, "Notification still cooling down");
            self.metrics.inc_notifications_suppressed();
            return Ok(DetectionOutcome::Suppressed {
                distribution,
                std_dev,
                last_sent,
            });
        }

        // Claim the notification before publishing. A failed swap means a
        // concurrent run claimed it first; this run stands down.
        if !self.checkpoint.compare_and_write(last_sent, now).await? {
            info!("Concurrent run advanced the checkpoint first");
            self.metrics.inc_notifications_suppressed();
            return Ok(DetectionOutcome::Suppressed {
                distribution,
                std_dev,
                last_sent,
            });
        }

        let alert = AlertMessage {
            keyword: self.config.keyword.clone(),
            window_hours: self.config.window_hours,
            distribution: distribution.clone(),
            std_dev,
            triggered_at: now,
        };

        // At-most-once delivery: the checkpoint has already advanced, so a
        // failed publish is logged and left for the next genuine anomaly.
        match self.notifier.publish(&alert.summary()).await {
            Ok(()) => self.metrics.inc_notifications_published(),
            Err(e) => warn!(error = %e, "Publish failed after checkpoint advance"),
        }

        Ok(DetectionOutcome::Notified {
            distribution,
            std_dev,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryCheckpointStore, MemoryEventStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Notifier that records every published message
    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn publish(&self, message: &str) -> Result<()> {
            self.messages.lock().await.push(message.to_string());
            Ok(())
        }
    }

    /// Checkpoint store whose swaps always lose
    struct ContestedCheckpointStore {
        value: i64,
        swap_attempts: AtomicUsize,
    }

    #[async_trait]
    impl CheckpointStore for ContestedCheckpointStore {
        async fn read(&self) -> Result<i64> {
            Ok(self.value)
        }

        async fn write(&self, _value: i64) -> Result<()> {
            Ok(())
        }

        async fn compare_and_write(&self, _expected: i64, _value: i64) -> Result<bool> {
            self.swap_attempts.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }
    }

    const NOW: i64 = 1_700_000_000;

    /// Seed the store so the trailing six hours bin to the given counts
    async fn seed_distribution(store: &MemoryEventStore, now: i64, counts: &[u64]) {
        let start = now - 6 * 3600;
        for (bin, &count) in counts.iter().enumerate() {
            for i in 0..count {
                // Offset keeps every event strictly inside its bin
                let ts = start + (bin as i64) * 3600 + 1 + i as i64;
                store.upsert(&format!("e-{}-{}", bin, i), ts).await.unwrap();
            }
        }
    }

    fn detector(
        store: Arc<MemoryEventStore>,
        checkpoint: Arc<dyn CheckpointStore>,
        notifier: Arc<RecordingNotifier>,
    ) -> AnomalyDetector {
        AnomalyDetector::new(store, checkpoint, notifier, DetectorConfig::new("outage"))
    }

    #[tokio::test]
    async fn test_quiet_window_produces_no_publish() {
        let store = Arc::new(MemoryEventStore::new());
        let checkpoint = Arc::new(MemoryCheckpointStore::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let outcome = detector(store, checkpoint.clone(), notifier.clone())
            .run_at(NOW)
            .await
            .unwrap();

        match outcome {
            DetectionOutcome::Normal {
                distribution,
                std_dev,
            } => {
                assert_eq!(distribution, vec![0, 0, 0, 0, 0, 0]);
                assert_eq!(std_dev, 0.0);
            }
            other => panic!("expected normal outcome, got {:?}", other),
        }
        assert!(notifier.messages.lock().await.is_empty());
        assert_eq!(checkpoint.read().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_spike_with_expired_checkpoint_publishes_once() {
        let store = Arc::new(MemoryEventStore::new());
        let checkpoint = Arc::new(MemoryCheckpointStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        seed_distribution(&store, NOW, &[5, 6, 4, 5, 600, 5]).await;

        let outcome = detector(store, checkpoint.clone(), notifier.clone())
            .run_at(NOW)
            .await
            .unwrap();

        match outcome {
            DetectionOutcome::Notified {
                distribution,
                std_dev,
            } => {
                assert_eq!(distribution, vec![5, 6, 4, 5, 600, 5]);
                assert!(std_dev > 100.0);
            }
            other => panic!("expected notified outcome, got {:?}", other),
        }

        let messages = notifier.messages.lock().await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("outage"));
        assert!(messages[0].contains("[5, 6, 4, 5, 600, 5]"));
        assert_eq!(checkpoint.read().await.unwrap(), NOW);
    }

    #[tokio::test]
    async fn test_spike_within_cooldown_is_suppressed() {
        let store = Arc::new(MemoryEventStore::new());
        // Last notification one hour ago, cooldown five hours
        let last_sent = NOW - 3600;
        let checkpoint = Arc::new(MemoryCheckpointStore::with_value(last_sent));
        let notifier = Arc::new(RecordingNotifier::default());
        seed_distribution(&store, NOW, &[5, 6, 4, 5, 600, 5]).await;

        let outcome = detector(store, checkpoint.clone(), notifier.clone())
            .run_at(NOW)
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            DetectionOutcome::Suppressed { last_sent: ls, .. } if ls == last_sent
        ));
        assert!(notifier.messages.lock().await.is_empty());
        assert_eq!(checkpoint.read().await.unwrap(), last_sent);
    }

    #[tokio::test]
    async fn test_spike_after_cooldown_expiry_publishes() {
        let store = Arc::new(MemoryEventStore::new());
        // Last notification six hours ago, outside the five-hour cooldown
        let checkpoint = Arc::new(MemoryCheckpointStore::with_value(NOW - 6 * 3600));
        let notifier = Arc::new(RecordingNotifier::default());
        seed_distribution(&store, NOW, &[5, 6, 4, 5, 600, 5]).await;

        let outcome = detector(store, checkpoint.clone(), notifier.clone())
            .run_at(NOW)
            .await
            .unwrap();

        assert!(matches!(outcome, DetectionOutcome::Notified { .. }));
        assert_eq!(notifier.messages.lock().await.len(), 1);
        assert_eq!(checkpoint.read().await.unwrap(), NOW);
    }

    #[tokio::test]
    async fn test_lost_checkpoint_race_suppresses_publish() {
        let store = Arc::new(MemoryEventStore::new());
        let checkpoint = Arc::new(ContestedCheckpointStore {
            value: 0,
            swap_attempts: AtomicUsize::new(0),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        seed_distribution(&store, NOW, &[5, 6, 4, 5, 600, 5]).await;

        let outcome = detector(store, checkpoint.clone(), notifier.clone())
            .run_at(NOW)
            .await
            .unwrap();

        assert!(matches!(outcome, DetectionOutcome::Suppressed { .. }));
        assert_eq!(checkpoint.swap_attempts.load(Ordering::SeqCst), 1);
        assert!(notifier.messages.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_single_bin_window_treated_as_normal() {
        let store = Arc::new(MemoryEventStore::new());
        let checkpoint = Arc::new(MemoryCheckpointStore::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let mut config = DetectorConfig::new("outage");
        config.window_hours = 1;

        let outcome = AnomalyDetector::new(store, checkpoint, notifier.clone(), config)
            .run_at(NOW)
            .await
            .unwrap();

        assert_eq!(outcome, DetectionOutcome::TooFewBins { bins: 1 });
        assert!(notifier.messages.lock().await.is_empty());
    }
}
