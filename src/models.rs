use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Up,
    Down,
}

/// Latest observation for one monitored URL. Serialised as-is for both
/// `GET /data` and the alert webhook body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub url: String,
    pub status: Status,
    #[serde(rename = "latency")]
    pub latency_seconds: Option<f64>,
    #[serde(rename = "code")]
    pub http_code: Option<u16>,
    pub timestamp: DateTime<Utc>,
}

impl ProbeResult {
    pub fn is_down(&self) -> bool {
        self.status == Status::Down
    }
}
