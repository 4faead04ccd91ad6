use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

mod alert;
mod api;
mod config;
mod engine;
mod error;
mod logging;
mod models;
mod normalize;
mod prober;
mod store;

use crate::config::MonitorConfig;
use crate::engine::Monitor;
use crate::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".into());
    let config = MonitorConfig::load(&config_path)?;

    let store = Arc::new(Store::new());
    let monitor = Arc::new(Monitor::new(&config, store)?);
    monitor.seed(&config.targets).await;

    let router = api::create_router(Arc::clone(&monitor), &config.static_dir);
    let server = tokio::spawn(api::start_server(config.api_port, router));
    tokio::spawn(Arc::clone(&monitor).run());

    tokio::select! {
        signal = signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received. Stopping monitor...");
        }
        joined = server => {
            joined??;
        }
    }

    Ok(())
}
