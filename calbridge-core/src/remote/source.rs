//! [`EventSource`] backed by a provider executable.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::date_range::DateRange;
use crate::error::{SyncError, SyncResult};
use crate::event::{EventRecord, NewEvent, Side};
use crate::remote::protocol::{CreateEvent, DeleteEvent, ListEvents, WireEvent};
use crate::remote::provider::{DEFAULT_PROVIDER_TIMEOUT, Provider};
use crate::source::{DeleteOutcome, EventSource};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RemoteConfig(pub HashMap<String, toml::Value>);

impl From<&RemoteConfig> for serde_json::Map<String, serde_json::Value> {
    fn from(config: &RemoteConfig) -> Self {
        config
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// Provider name plus its parameters, as written in a config section:
///
/// ```toml
/// [icloud]
/// provider = "icloud"
/// icloud_account = "me@icloud.com"
/// calendar_name = "Family"
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Remote {
    pub provider: Provider,
    #[serde(flatten)]
    pub config: RemoteConfig,
}

impl Remote {
    pub fn new(provider: Provider, config: RemoteConfig) -> Self {
        Remote { provider, config }
    }

    fn remote_config(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::from(&self.config)
    }
}

/// One side of the bridge, reached through `calbridge-provider-<name>`.
pub struct ProviderSource {
    side: Side,
    remote: Remote,
    timeout: Duration,
}

impl ProviderSource {
    pub fn new(side: Side, remote: Remote) -> Self {
        ProviderSource {
            side,
            remote,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl EventSource for ProviderSource {
    fn side(&self) -> Side {
        self.side
    }

    async fn list(&self, range: &DateRange) -> SyncResult<Vec<EventRecord>> {
        let values = self
            .remote
            .provider
            .call(
                ListEvents {
                    remote_config: self.remote.remote_config(),
                    from: range.from_rfc3339(),
                    to: range.to_rfc3339(),
                },
                self.timeout,
            )
            .await
            .map_err(|e| SyncError::Source {
                side: self.side,
                message: e.to_string(),
            })?;

        let records = parse_listing(self.side, values);
        debug!(side = %self.side, count = records.len(), "Listed events");
        Ok(records)
    }

    async fn create(&self, event: &NewEvent) -> SyncResult<String> {
        let created = self
            .remote
            .provider
            .call(
                CreateEvent {
                    remote_config: self.remote.remote_config(),
                    event: event.clone(),
                },
                self.timeout,
            )
            .await?;
        Ok(created.id)
    }

    async fn delete(&self, event_id: &str) -> SyncResult<DeleteOutcome> {
        self.remote
            .provider
            .call(
                DeleteEvent {
                    remote_config: self.remote.remote_config(),
                    event_id: event_id.to_string(),
                },
                self.timeout,
            )
            .await
    }
}

/// Turn a provider listing into records, skipping elements that don't parse.
fn parse_listing(side: Side, values: Vec<serde_json::Value>) -> Vec<EventRecord> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<WireEvent>(value) {
            Ok(wire) => Some(wire.into_record(side)),
            Err(e) => {
                warn!(side = %side, error = %e, "Skipping malformed event");
                None
            }
        })
        .collect()
}
