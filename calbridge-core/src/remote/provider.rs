//! Running a calendar's provider binary.
//!
//! Each list, create or delete is one short-lived `calbridge-provider-<name>`
//! process: one JSON request line on stdin, one JSON response on stdout.
//! Credentials stay with the provider.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::error::{SyncError, SyncResult};
use crate::remote::protocol::{Command, ProviderCommand, Request, Response};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn binary_name(&self) -> String {
        format!("calbridge-provider-{}", self.0)
    }

    fn binary_path(&self) -> SyncResult<std::path::PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| SyncError::ProviderNotInstalled(binary_name))
    }

    /// Run `cmd` and decode its reply, giving up after `limit`. The child is
    /// killed when the limit is hit.
    pub async fn call<C: ProviderCommand>(&self, cmd: C, limit: Duration) -> SyncResult<C::Response> {
        timeout(limit, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| SyncError::ProviderTimeout(limit.as_secs()))?
    }

    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> SyncResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| SyncError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| SyncError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SyncError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SyncError::Provider("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(SyncError::Provider(format!(
                "{} exited with status: {}",
                self.binary_name(),
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(SyncError::Provider(format!(
                "{} returned no response",
                self.binary_name()
            )));
        }

        let response: Response<R> = serde_json::from_str(&response_str)
            .map_err(|e| SyncError::Provider(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(SyncError::Provider(error)),
        }
    }
}
