//! calbridge configuration (~/.config/calbridge/config.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use calbridge_core::constants::DEFAULT_SYNC_INTERVAL_SECS;
use calbridge_core::remote::{DEFAULT_PROVIDER_TIMEOUT, Remote};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

const EXAMPLE_CONFIG: &str = "\
# Where sync state is kept:
# state_file = \"~/.local/share/calbridge/sync_state.json\"

# Seconds between passes:
# sync_interval = 900

# notify_url = \"https://notify.sh/your-topic\"

[google]
provider = \"google\"
google_account = \"you@gmail.com\"
google_calendar_id = \"primary\"

[icloud]
provider = \"icloud\"
icloud_account = \"you@icloud.com\"
calendar_name = \"Family\"
";

fn default_state_file() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("calbridge"))
        .unwrap_or_default()
        .join("sync_state.json")
}

fn default_sync_interval() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

fn default_provider_timeout() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT.as_secs()
}

/// Read once at startup; every field can be overridden with a
/// `CALBRIDGE_<FIELD>` environment variable.
#[derive(Debug, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Seconds between two passes of `calbridge run`.
    #[serde(default = "default_sync_interval")]
    pub sync_interval: u64,

    /// Seconds a provider call may take before it counts as failed.
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout: u64,

    /// Pass summaries are POSTed here. Logged only when unset.
    #[serde(default)]
    pub notify_url: Option<String>,

    pub google: Remote,
    pub icloud: Remote,
}

impl BridgeConfig {
    /// ~/.config/calbridge/config.toml
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("calbridge");
        Ok(config_dir.join("config.toml"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            anyhow::bail!(
                "Config file not found at {}\n\nCreate it with something like:\n\n{}",
                path.display(),
                EXAMPLE_CONFIG
            );
        }

        Config::builder()
            .add_source(File::from(path.clone()).format(FileFormat::Toml))
            .add_source(Environment::with_prefix("CALBRIDGE").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize::<BridgeConfig>())
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// State file location with `~` expanded.
    pub fn state_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.state_file.to_string_lossy()).into_owned())
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_example_config_loads_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, EXAMPLE_CONFIG);

        let config = BridgeConfig::load(Some(&path)).unwrap();

        assert_eq!(config.sync_interval(), Duration::from_secs(900));
        assert_eq!(config.provider_timeout(), DEFAULT_PROVIDER_TIMEOUT);
        assert!(config.notify_url.is_none());
        assert_eq!(config.google.provider.name(), "google");
        assert_eq!(config.icloud.provider.name(), "icloud");
        assert!(config.icloud.config.0.contains_key("calendar_name"));
        assert!(config.state_path().ends_with("calbridge/sync_state.json"));
    }

    #[test]
    fn test_explicit_values_and_tilde_expansion() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
state_file = "~/calbridge/state.json"
sync_interval = 60
notify_url = "https://notify.example/topic"

[google]
provider = "google"

[icloud]
provider = "icloud"
"#,
        );

        let config = BridgeConfig::load(Some(&path)).unwrap();

        assert_eq!(config.sync_interval, 60);
        assert_eq!(config.notify_url.as_deref(), Some("https://notify.example/topic"));
        let state = config.state_path();
        assert!(!state.to_string_lossy().starts_with('~'));
        assert!(state.ends_with("calbridge/state.json"));
    }

    #[test]
    fn test_missing_file_explains_what_to_write() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("[google]"));
    }

    #[test]
    fn test_missing_side_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[google]\nprovider = \"google\"\n");
        assert!(BridgeConfig::load(Some(&path)).is_err());
    }
}
