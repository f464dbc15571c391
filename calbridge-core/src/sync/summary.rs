//! Per-direction results of a pass and their human-readable summary.

use serde::Serialize;

use crate::constants::SUMMARY_SAMPLE_SIZE;
use crate::event::{EventTime, Side};
use crate::state::SyncState;

/// Title and start of an event that was copied or removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSummary {
    pub title: String,
    pub start: EventTime,
}

/// What one direction of the bridge did during a pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectionResult {
    pub added: usize,
    pub deleted: usize,
    pub errors: usize,
    pub added_events: Vec<EventSummary>,
    pub deleted_events: Vec<EventSummary>,
}

impl DirectionResult {
    pub(crate) fn record_added(&mut self, title: &str, start: &EventTime) {
        self.added += 1;
        self.added_events.push(EventSummary {
            title: title.to_string(),
            start: start.clone(),
        });
    }

    pub(crate) fn record_deleted(&mut self, title: &str, start: &EventTime) {
        self.deleted += 1;
        self.deleted_events.push(EventSummary {
            title: title.to_string(),
            start: start.clone(),
        });
    }
}

/// Results of both directions of one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncSummary {
    pub google_to_icloud: DirectionResult,
    pub icloud_to_google: DirectionResult,
}

impl SyncSummary {
    /// Results for events that originated on `from`.
    pub fn direction(&self, from: Side) -> &DirectionResult {
        match from {
            Side::Google => &self.google_to_icloud,
            Side::Icloud => &self.icloud_to_google,
        }
    }

    pub(crate) fn direction_mut(&mut self, from: Side) -> &mut DirectionResult {
        match from {
            Side::Google => &mut self.google_to_icloud,
            Side::Icloud => &mut self.icloud_to_google,
        }
    }

    pub fn added(&self) -> usize {
        self.google_to_icloud.added + self.icloud_to_google.added
    }

    pub fn deleted(&self) -> usize {
        self.google_to_icloud.deleted + self.icloud_to_google.deleted
    }

    pub fn errors(&self) -> usize {
        self.google_to_icloud.errors + self.icloud_to_google.errors
    }

    /// One-line outcome for logs.
    pub fn headline(&self) -> String {
        format!(
            "Sync complete: {} from Google, {} from iCloud, {} deleted, {} failed",
            self.google_to_icloud.added,
            self.icloud_to_google.added,
            self.deleted(),
            self.errors()
        )
    }

    /// Notification body, or `None` when the pass changed nothing and
    /// nothing failed.
    pub fn message(&self) -> Option<String> {
        if self.added() == 0 && self.deleted() == 0 && self.errors() == 0 {
            return None;
        }

        let mut lines = Vec::new();

        for from in [Side::Google, Side::Icloud] {
            let result = self.direction(from);
            push_category(
                &mut lines,
                &format!("Added {} from {}:", result.added, from),
                '+',
                &result.added_events,
            );
        }

        // Deletions are reported by the calendar they were removed from
        for from in [Side::Google, Side::Icloud] {
            let result = self.direction(from);
            push_category(
                &mut lines,
                &format!("Deleted {} from {}:", result.deleted, from.other()),
                '-',
                &result.deleted_events,
            );
        }

        if self.errors() > 0 {
            lines.push(format!("{} event(s) failed to sync", self.errors()));
        }

        Some(lines.join("\n"))
    }
}

fn push_category(lines: &mut Vec<String>, heading: &str, marker: char, events: &[EventSummary]) {
    if events.is_empty() {
        return;
    }

    lines.push(heading.to_string());
    for event in events.iter().take(SUMMARY_SAMPLE_SIZE) {
        lines.push(format!("  {} {} ({})", marker, event.title, event.start.date_label()));
    }
    if events.len() > SUMMARY_SAMPLE_SIZE {
        lines.push(format!("  ... and {} more", events.len() - SUMMARY_SAMPLE_SIZE));
    }
}

/// Outcome of [`SyncEngine::sync`](crate::sync::SyncEngine::sync).
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub summary: SyncSummary,
    /// Set when a calendar could not be reached and the pass was cut short.
    pub failure: Option<String>,
    /// The snapshot that was persisted.
    pub state: SyncState,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> EventTime {
        format!("2025-01-{:02}T09:00:00Z", d).parse().unwrap()
    }

    #[test]
    fn test_quiet_pass_has_no_message() {
        assert_eq!(SyncSummary::default().message(), None);
    }

    #[test]
    fn test_message_lists_categories() {
        let mut summary = SyncSummary::default();
        summary.direction_mut(Side::Google).record_added("Standup", &day(10));
        summary.direction_mut(Side::Icloud).record_added("Dentist", &"2025-02-01".parse().unwrap());
        summary.direction_mut(Side::Google).record_deleted("Retro", &day(12));

        assert_eq!(
            summary.message().unwrap(),
            "Added 1 from Google:\n  \
             + Standup (2025-01-10)\n\
             Added 1 from iCloud:\n  \
             + Dentist (2025-02-01)\n\
             Deleted 1 from iCloud:\n  \
             - Retro (2025-01-12)"
        );
    }

    #[test]
    fn test_message_caps_samples_at_five() {
        let mut summary = SyncSummary::default();
        for d in 1..=8 {
            summary.direction_mut(Side::Icloud).record_deleted(&format!("Event {d}"), &day(d));
        }

        let message = summary.message().unwrap();
        let lines: Vec<_> = message.lines().collect();
        assert_eq!(lines[0], "Deleted 8 from Google:");
        assert_eq!(lines.len(), 1 + 5 + 1);
        assert_eq!(lines[5], "  - Event 5 (2025-01-05)");
        assert_eq!(lines[6], "  ... and 3 more");
    }

    #[test]
    fn test_errors_alone_produce_a_message() {
        let mut summary = SyncSummary::default();
        summary.direction_mut(Side::Google).errors = 2;

        assert_eq!(summary.message().unwrap(), "2 event(s) failed to sync");
        assert_eq!(summary.errors(), 2);
    }
}
