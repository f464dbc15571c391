//! Notification delivery for pass summaries.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use calbridge_core::notify::Notifier;
use tracing::{info, warn};

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs the summary as a plain-text body (notify.sh / ntfy style).
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .context("Failed to build notification client")?;

        Ok(WebhookNotifier {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, title: &str, body: &str) {
        let result = self
            .client
            .post(&self.url)
            .header("Title", title)
            .body(body.to_string())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(title, "Notification sent")
            }
            Ok(response) => {
                warn!(title, status = %response.status(), "Failed to send notification")
            }
            Err(e) => warn!(title, error = %e, "Failed to send notification"),
        }
    }
}

/// Used when no `notify_url` is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, body: &str) {
        info!(title, "Notification:\n{body}");
    }
}

pub fn from_config(notify_url: Option<&str>) -> Result<Box<dyn Notifier>> {
    match notify_url {
        Some(url) if !url.is_empty() => Ok(Box::new(WebhookNotifier::new(url)?)),
        _ => Ok(Box::new(LogNotifier)),
    }
}
