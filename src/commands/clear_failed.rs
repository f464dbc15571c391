use anyhow::{Context, Result};
use calbridge_core::state::SyncStateStore;

use crate::config::BridgeConfig;

/// Forget every failed entry so the next pass tries those events again.
pub fn run(config: &BridgeConfig) -> Result<()> {
    let store = SyncStateStore::new(config.state_path());
    let state = store.load().context("Failed to read sync state")?;

    let failed = state.failed_entries().count();
    if failed == 0 {
        println!("No failed entries.");
        return Ok(());
    }

    store
        .save(&state.without_failed())
        .context("Failed to write sync state")?;

    let noun = if failed == 1 { "entry" } else { "entries" };
    println!("Cleared {failed} failed {noun}; they will be retried on the next sync.");
    Ok(())
}
