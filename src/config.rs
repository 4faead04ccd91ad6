use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitorConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
    #[serde(default = "default_timeout")]
    pub probe_timeout_ms: u64,
    pub webhook_url: Option<String>,
    #[serde(default = "default_alerts_enabled")]
    pub alerts_enabled: bool,
    #[serde(default)]
    pub alert_mode: AlertMode,
    #[serde(default = "default_timeout")]
    pub webhook_timeout_ms: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// When a DOWN observation turns into a webhook call.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertMode {
    /// Every DOWN result alerts, including repeats for a target already down.
    #[default]
    EveryDown,
    /// Only the first DOWN after an UP (or after the target was added) alerts.
    OnTransition,
}

fn default_api_port() -> u16 { 3000 }
fn default_check_interval() -> u64 { 120 }
fn default_alerts_enabled() -> bool { true }
fn default_max_concurrency() -> usize { 32 }
fn default_static_dir() -> String { "public".into() }
pub fn default_timeout() -> u64 { 8000 }

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            check_interval: default_check_interval(),
            probe_timeout_ms: default_timeout(),
            webhook_url: None,
            alerts_enabled: default_alerts_enabled(),
            alert_mode: AlertMode::default(),
            webhook_timeout_ms: default_timeout(),
            max_concurrency: default_max_concurrency(),
            targets: Vec::new(),
            static_dir: default_static_dir(),
        }
    }
}

impl MonitorConfig {
    /// Reads the config file if it exists, then applies `PORT` and
    /// `ALERT_WEBHOOK_URL` from the environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_json(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            info!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env(
            std::env::var("PORT").ok().as_deref(),
            std::env::var("ALERT_WEBHOOK_URL").ok().as_deref(),
        )?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    fn apply_env(&mut self, port: Option<&str>, webhook_url: Option<&str>) -> Result<()> {
        if let Some(port) = port {
            self.api_port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {:?}", port))?;
        }
        if let Some(url) = webhook_url.map(str::trim).filter(|u| !u.is_empty()) {
            self.webhook_url = Some(url.to_string());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.check_interval == 0 {
            bail!("check_interval must be at least 1 second");
        }
        if self.probe_timeout_ms == 0 {
            bail!("probe_timeout_ms must be at least 1");
        }
        if self.webhook_timeout_ms == 0 {
            bail!("webhook_timeout_ms must be at least 1");
        }
        if self.max_concurrency == 0 {
            bail!("max_concurrency must be at least 1");
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_millis(self.webhook_timeout_ms)
    }

    /// The webhook to alert, or `None` when alerting is switched off.
    pub fn alert_webhook(&self) -> Option<&str> {
        if self.alerts_enabled {
            self.webhook_url.as_deref()
        } else {
            None
        }
    }
}
