use anyhow::{Context, Result};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::models::ProbeResult;

/// Posts DOWN results to the configured webhook. Each call is a single
/// attempt on its own task: no retry, and nothing flows back to the caller.
#[derive(Clone)]
pub struct AlertDispatcher {
    http_client: reqwest::Client,
    webhook_url: Option<String>,
}

impl AlertDispatcher {
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build webhook HTTP client")?;
        Ok(Self { http_client, webhook_url })
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Spawns the delivery and returns its handle, or `None` when no webhook
    /// is configured. Callers are free to drop the handle.
    pub fn dispatch(&self, result: ProbeResult) -> Option<JoinHandle<()>> {
        let url = self.webhook_url.clone()?;
        let client = self.http_client.clone();
        Some(tokio::spawn(async move {
            send_webhook(&client, &url, &result).await;
        }))
    }
}

async fn send_webhook(client: &reqwest::Client, webhook_url: &str, result: &ProbeResult) {
    let delivery = client
        .post(webhook_url)
        .json(result)
        .send()
        .await
        .and_then(|response| response.error_for_status());

    match delivery {
        Ok(_) => info!("Sent alert for DOWN target {}", result.url),
        Err(e) => error!("Failed to send alert for {}: {}", result.url, e),
    }
}
