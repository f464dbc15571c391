//! Error types for calbridge.

use thiserror::Error;

use crate::event::Side;

/// Errors that can occur while reconciling calendars.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("{side} unavailable: {message}")]
    Source { side: Side, message: String },

    #[error("Sync state error: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for calbridge operations.
pub type SyncResult<T> = Result<T, SyncError>;
