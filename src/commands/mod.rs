pub mod clear_failed;
pub mod once;
pub mod run;
pub mod status;

use anyhow::Result;
use calbridge_core::event::Side;
use calbridge_core::notify::Notifier;
use calbridge_core::remote::ProviderSource;
use calbridge_core::state::SyncStateStore;
use calbridge_core::sync::SyncEngine;

use crate::config::BridgeConfig;
use crate::notify;

/// Both calendars, the state file and the notifier, built once from config.
pub struct Bridge {
    google: ProviderSource,
    icloud: ProviderSource,
    store: SyncStateStore,
    notifier: Box<dyn Notifier>,
}

impl Bridge {
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let timeout = config.provider_timeout();

        Ok(Bridge {
            google: ProviderSource::new(Side::Google, config.google.clone()).with_timeout(timeout),
            icloud: ProviderSource::new(Side::Icloud, config.icloud.clone()).with_timeout(timeout),
            store: SyncStateStore::new(config.state_path()),
            notifier: notify::from_config(config.notify_url.as_deref())?,
        })
    }

    pub fn engine(&self) -> SyncEngine<'_> {
        SyncEngine::new(
            &self.google,
            &self.icloud,
            self.store.clone(),
            self.notifier.as_ref(),
        )
    }
}
