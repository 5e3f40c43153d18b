//! Notification delivery
//!
//! Publishing is fire-and-forget: subscribers are best-effort and a slow or
//! broken subscriber never fails the detection run that produced the alert.

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub use async_trait::async_trait;

/// Destination for alert messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one rendered alert message
    async fn publish(&self, message: &str) -> Result<()>;
}

/// Notifier that emits the alert into the structured log stream
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn publish(&self, message: &str) -> Result<()> {
        info!(event = "alert_published", message = %message, "Alert");
        Ok(())
    }
}

/// Notifier that POSTs the alert to a webhook URL as a JSON body
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        let url = Url::parse(url)?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn publish(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&json!({ "message": message }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("webhook error ({}): {}", status, body);
        }

        Ok(())
    }
}

/// Delivers one alert to every subscriber
///
/// Failures are logged per subscriber and swallowed, so delivery to the
/// remaining subscribers always proceeds and publish itself never fails.
#[derive(Default)]
pub struct FanoutNotifier {
    subscribers: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber to the fan-out
    pub fn subscribe(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.subscribers.push(notifier);
        self
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn publish(&self, message: &str) -> Result<()> {
        for (index, subscriber) in self.subscribers.iter().enumerate() {
            if let Err(e) = subscriber.publish(message).await {
                warn!(subscriber = index, error = %e, "Subscriber delivery failed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingNotifier {
        deliveries: AtomicUsize,
    }

    impl CountingNotifier {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                deliveries: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn publish(&self, _message: &str) -> Result<()> {
            self.deliveries.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn publish(&self, _message: &str) -> Result<()> {
            anyhow::bail!("subscriber down")
        }
    }

    #[tokio::test]
    async fn test_fanout_delivers_to_all_subscribers() {
        let first = CountingNotifier::new();
        let second = CountingNotifier::new();

        let fanout = FanoutNotifier::new()
            .subscribe(first.clone())
            .subscribe(second.clone());

        fanout.publish("test alert").await.unwrap();

        assert_eq!(first.deliveries.load(Ordering::SeqCst), 1);
        assert_eq!(second.deliveries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fanout_continues_past_failing_subscriber() {
        let healthy = CountingNotifier::new();

        let fanout = FanoutNotifier::new()
            .subscribe(Arc::new(FailingNotifier))
            .subscribe(healthy.clone());

        // Publish succeeds even though the first subscriber failed
        fanout.publish("test alert").await.unwrap();
        assert_eq!(healthy.deliveries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_fanout_is_a_no_op() {
        let fanout = FanoutNotifier::new();
        assert_eq!(fanout.subscriber_count(), 0);
        fanout.publish("test alert").await.unwrap();
    }

    #[test]
    fn test_webhook_rejects_invalid_url() {
        assert!(WebhookNotifier::new("not a url").is_err());
    }
}
