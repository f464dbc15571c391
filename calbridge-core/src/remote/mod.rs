//! Calendars reached through provider executables.

pub mod protocol;
mod provider;
mod source;

pub use provider::{DEFAULT_PROVIDER_TIMEOUT, Provider};
pub use source::{ProviderSource, Remote, RemoteConfig};
