use anyhow::{Context, Result};
use chrono::Utc;

use crate::commands::Bridge;
use crate::config::BridgeConfig;

/// A single pass. Fails (non-zero exit) if a calendar could not be reached.
pub async fn run(config: &BridgeConfig) -> Result<()> {
    let bridge = Bridge::from_config(config)?;

    let report = bridge
        .engine()
        .sync(Utc::now())
        .await
        .context("Sync pass could not run")?;

    if let Some(failure) = report.failure {
        anyhow::bail!(failure);
    }

    println!("{}", report.summary.headline());
    if let Some(message) = report.summary.message() {
        println!("\n{message}");
    }

    Ok(())
}
