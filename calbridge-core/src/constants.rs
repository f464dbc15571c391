/// Days before now covered by the propagation scan.
pub const ACTIVE_WINDOW_PAST_DAYS: i64 = 1;

/// Days after now covered by the propagation scan.
pub const ACTIVE_WINDOW_FUTURE_DAYS: i64 = 90;

/// Days in each direction searched when locating a record to delete.
pub const SEARCH_WINDOW_DAYS: i64 = 365;

/// Seconds between two sync passes.
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 900;

/// Title given to events that have none.
pub const DEFAULT_EVENT_TITLE: &str = "No Title";

/// Sample titles listed per category in a pass summary.
pub const SUMMARY_SAMPLE_SIZE: usize = 5;
