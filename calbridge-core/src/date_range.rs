//! Time windows used to scan the two calendars.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::constants::{ACTIVE_WINDOW_FUTURE_DAYS, ACTIVE_WINDOW_PAST_DAYS, SEARCH_WINDOW_DAYS};
use crate::event::EventTime;

/// Closed range `[from, to]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// The propagation window: `[now - 1 day, now + 90 days]`.
    ///
    /// Deletion detection is limited to this window too, so an event that
    /// merely drifted past the scan horizon is not mistaken for a deletion.
    pub fn active(now: DateTime<Utc>) -> Self {
        DateRange {
            from: now - Duration::days(ACTIVE_WINDOW_PAST_DAYS),
            to: now + Duration::days(ACTIVE_WINDOW_FUTURE_DAYS),
        }
    }

    /// The wider window searched when locating a record to delete: ±365 days.
    pub fn search(now: DateTime<Utc>) -> Self {
        DateRange {
            from: now - Duration::days(SEARCH_WINDOW_DAYS),
            to: now + Duration::days(SEARCH_WINDOW_DAYS),
        }
    }

    pub fn contains(&self, time: &EventTime) -> bool {
        let instant = time.to_utc();
        instant >= self.from && instant <= self.to
    }

    pub fn from_rfc3339(&self) -> String {
        self.from.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn to_rfc3339(&self) -> String {
        self.to.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}
