use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info};

use crate::commands::Bridge;
use crate::config::BridgeConfig;

/// Sync forever, one pass per interval. Passes never overlap: the next one is
/// scheduled only after the previous one has returned.
pub async fn run(config: &BridgeConfig, interval: Option<u64>) -> Result<()> {
    let bridge = Bridge::from_config(config)?;
    let engine = bridge.engine();
    let interval = interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.sync_interval());

    info!(
        state = %engine.store().path().display(),
        "calbridge starting, syncing every {}",
        humantime::format_duration(interval)
    );

    loop {
        if let Err(e) = engine.sync(Utc::now()).await {
            error!(error = %e, "Sync pass could not run");
        }

        info!("Next sync in {}", humantime::format_duration(interval));

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}
