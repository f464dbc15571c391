//! Delivery of pass summaries to a human.

use async_trait::async_trait;

/// Best-effort notification channel. Failures are the implementation's to log;
/// the engine never retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str);
}
