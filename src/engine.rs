use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::alert::AlertDispatcher;
use crate::config::{AlertMode, MonitorConfig};
use crate::models::{ProbeResult, Status};
use crate::normalize::NormalizeError;
use crate::prober::Prober;
use crate::store::{Store, TargetChange, Upsert};

/// Summary of one pass over the monitored list.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub checked: usize,
    pub down: usize,
    pub elapsed: Duration,
}

/// Drives the periodic check cycle and the out-of-band probe for newly
/// added targets. Shared between the scheduler task and the HTTP handlers.
pub struct Monitor {
    pub store: Arc<Store>,
    prober: Prober,
    alerts: AlertDispatcher,
    alert_mode: AlertMode,
    check_interval: Duration,
    concurrency_limiter: Arc<Semaphore>,
}

impl Monitor {
    pub fn new(config: &MonitorConfig, store: Arc<Store>) -> Result<Self> {
        let alerts = AlertDispatcher::new(
            config.alert_webhook().map(str::to_string),
            config.webhook_timeout(),
        )?;
        Ok(Self {
            store,
            prober: Prober::new(config.probe_timeout())?,
            alerts,
            alert_mode: config.alert_mode,
            check_interval: config.check_interval(),
            concurrency_limiter: Arc::new(Semaphore::new(config.max_concurrency)),
        })
    }

    /// Adds each seed target, logging and skipping the ones that do not
    /// normalise.
    pub async fn seed(&self, targets: &[String]) {
        for raw in targets {
            if let Err(e) = self.store.add_target(raw).await {
                warn!("Skipping seed target {:?}: {}", raw, e);
            }
        }
        info!("Monitoring {} targets", self.store.list_targets().await.len());
    }

    pub async fn run(self: Arc<Self>) {
        info!(
            "Check scheduler active: every {}s, probe timeout {:?}, alerts {}",
            self.check_interval.as_secs(),
            self.prober.timeout(),
            if self.alerts.is_enabled() { "on" } else { "off" }
        );

        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// Probes every target monitored at cycle start once, stores the results
    /// and alerts on DOWN ones. Targets added while the cycle runs wait for
    /// the next one.
    pub async fn run_cycle(&self) -> CycleReport {
        info!("Running check cycle...");
        let start = Instant::now();
        let targets = self.store.list_targets().await;

        let mut tasks = FuturesUnordered::new();
        for (index, url) in targets.into_iter().enumerate() {
            let prober = self.prober.clone();
            let limiter = Arc::clone(&self.concurrency_limiter);
            tasks.push(tokio::spawn(async move {
                let _permit = limiter.acquire_owned().await.ok();
                (index, prober.probe(&url).await)
            }));
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!("Probe task failed: {}", e),
            }
        }
        results.sort_by_key(|(index, _)| *index);

        let checked = results.len();
        let mut down = 0;
        for (_, result) in results {
            if result.is_down() {
                down += 1;
            }
            self.process_result(result).await;
        }

        let report = CycleReport { checked, down, elapsed: start.elapsed() };
        info!(
            "Check cycle completed {} checks ({} down) in {:.2}s.",
            report.checked,
            report.down,
            report.elapsed.as_secs_f64()
        );
        report
    }

    /// Adds a target and, if it is new, probes it right away so the caller
    /// sees a result without waiting for the next cycle.
    pub async fn add_target(&self, raw: &str) -> Result<TargetChange, NormalizeError> {
        let change = self.store.add_target(raw).await?;
        if change.changed {
            info!("Added {}", change.url);
            let result = self.prober.probe(&change.url).await;
            self.process_result(result).await;
        }
        Ok(change)
    }

    pub async fn remove_target(&self, raw: &str) -> Result<TargetChange, NormalizeError> {
        let change = self.store.remove_target(raw).await?;
        if change.changed {
            info!("Removed {}", change.url);
        }
        Ok(change)
    }

    async fn process_result(&self, result: ProbeResult) {
        let previous = match self.store.upsert_result(result.clone()).await {
            Upsert::Stored { previous } => previous,
            Upsert::Untracked => return,
        };

        if result.status != Status::Down {
            return;
        }
        warn!(
            "[DOWN] {} (code: {})",
            result.url,
            result.http_code.map_or("none".to_string(), |c| c.to_string())
        );

        let should_alert = match self.alert_mode {
            AlertMode::EveryDown => true,
            AlertMode::OnTransition => previous != Some(Status::Down),
        };
        if should_alert {
            let _ = self.alerts.dispatch(result);
        }
    }
}
