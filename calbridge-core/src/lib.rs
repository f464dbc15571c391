//! Core of calbridge: keeps a Google calendar and an iCloud calendar in sync.
//!
//! - `event` and `identity` describe records and how they match across calendars
//! - `source` is the capability each calendar provides; `remote` implements it
//!   with provider executables
//! - `state` persists what has been synced
//! - `sync` runs a reconciliation pass

pub mod constants;
pub mod date_range;
pub mod error;
pub mod event;
pub mod identity;
pub mod notify;
pub mod remote;
pub mod source;
pub mod state;
pub mod sync;

pub use error::{SyncError, SyncResult};
