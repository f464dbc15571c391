//! Bidirectional reconciliation of the two calendars.

mod engine;
mod plan;
mod summary;

pub use engine::{ERROR_NOTIFICATION_TITLE, NOTIFICATION_TITLE, Reconciliation, SyncEngine};
pub use plan::{Propagation, PropagationAction, Snapshot, plan_deletions, plan_propagation};
pub use summary::{DirectionResult, EventSummary, SyncReport, SyncSummary};
