use anyhow::{Context, Result};
use calbridge_core::event::Side;
use calbridge_core::state::{SyncState, SyncStateStore};
use owo_colors::OwoColorize;

use crate::config::BridgeConfig;

pub fn run(config: &BridgeConfig, json: bool) -> Result<()> {
    let store = SyncStateStore::new(config.state_path());
    let state = store.load().context("Failed to read sync state")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!("State file: {}", store.path().display());
    print!("{}", render(&state));
    Ok(())
}

fn render(state: &SyncState) -> String {
    let mut out = String::new();

    let last_sync = state
        .last_sync
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    out.push_str(&format!("Last sync:  {}\n", last_sync));

    if let Some(error) = &state.last_error {
        out.push_str(&format!("Last error: {}\n", error.red()));
    }

    out.push_str(&format!(
        "Tracking {} events ({} from {}, {} from {})\n",
        state.entries.len(),
        state.count_from(Side::Google),
        Side::Google,
        state.count_from(Side::Icloud),
        Side::Icloud
    ));

    let failed: Vec<_> = state.failed_entries().collect();
    if !failed.is_empty() {
        out.push_str(&format!("\n{}\n", format!("{} failed:", failed.len()).yellow()));
        for (key, entry) in failed {
            out.push_str(&format!(
                "  {} {} ({}) [{}]: {}\n",
                "✗".red(),
                entry.title,
                entry.start.date_label(),
                key,
                entry.error.as_deref().unwrap_or("unknown error").dimmed()
            ));
        }
        out.push_str("\nRun `calbridge clear-failed` to retry them on the next sync.\n");
    }

    out
}
