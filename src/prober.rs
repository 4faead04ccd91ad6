use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::{ProbeResult, Status};

/// Issues one bounded HTTP GET per call and folds every outcome into a
/// [`ProbeResult`].
#[derive(Clone)]
pub struct Prober {
    client: reqwest::Client,
    timeout: Duration,
}

impl Prober {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("urlpulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build probe HTTP client")?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn probe(&self, url: &str) -> ProbeResult {
        let start = Instant::now();
        let (status, latency_seconds, http_code) =
            match tokio::time::timeout(self.timeout, self.client.get(url).send()).await {
                Ok(Ok(response)) => {
                    let code = response.status();
                    let status = if code == StatusCode::OK { Status::Up } else { Status::Down };
                    // Error statuses count as failed requests and carry no latency.
                    let latency = code.is_success().then(|| start.elapsed().as_secs_f64());
                    (status, latency, Some(code.as_u16()))
                }
                Ok(Err(e)) => {
                    debug!("Probe of {} failed: {}", url, e);
                    (Status::Down, None, e.status().map(|s| s.as_u16()))
                }
                Err(_) => {
                    debug!("Probe of {} timed out after {:?}", url, self.timeout);
                    (Status::Down, None, None)
                }
            };

        ProbeResult {
            url: url.to_string(),
            status,
            latency_seconds,
            http_code,
            timestamp: Utc::now(),
        }
    }
}
