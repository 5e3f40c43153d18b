//! Core data models for the sentinel

use serde::{Deserialize, Serialize};

/// A single observed social-media event
///
/// Events are keyed by `id`; storing the same id twice overwrites the
/// existing record, which makes ingestion idempotent across pages and runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// Creation time in seconds since the Unix epoch
    pub created_at: i64,
}

impl Event {
    pub fn new(id: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            created_at,
        }
    }
}

/// Notification payload emitted when the event rate turns anomalous
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Keyword the monitored events match
    pub keyword: String,
    /// Width of the scanned window in hours
    pub window_hours: u64,
    /// Event counts per time bin, oldest bin first
    pub distribution: Vec<u64>,
    /// Sample standard deviation of the bin counts
    pub std_dev: f64,
    /// When the alert fired, seconds since the Unix epoch
    pub triggered_at: i64,
}

impl AlertMessage {
    /// Human-readable rendering for log and topic subscribers
    pub fn summary(&self) -> String {
        format!(
            "Elevated levels of activity for \"{}\". Distribution over past {} hours: {:?}. Standard deviation: {:.2}",
            self.keyword, self.window_hours, self.distribution, self.std_dev
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_summary_contains_distribution_and_std_dev() {
        let alert = AlertMessage {
            keyword: "outage".to_string(),
            window_hours: 6,
            distribution: vec![5, 6, 4, 5, 600, 5],
            std_dev: 242.97,
            triggered_at: 1_700_000_000,
        };

        let summary = alert.summary();
        assert!(summary.contains("outage"));
        assert!(summary.contains("[5, 6, 4, 5, 600, 5]"));
        assert!(summary.contains("242.97"));
    }

    #[test]
    fn test_alert_serializes_to_json() {
        let alert = AlertMessage {
            keyword: "outage".to_string(),
            window_hours: 6,
            distribution: vec![0, 0, 1],
            std_dev: 0.58,
            triggered_at: 1_700_000_000,
        };

        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"keyword\":\"outage\""));
        assert!(json.contains("\"distribution\":[0,0,1]"));
    }
}
