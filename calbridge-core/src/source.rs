//! The capability each calendar must provide to the reconciliation engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::error::SyncResult;
use crate::event::{EventRecord, NewEvent, Side};

/// Outcome of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    /// The record was already gone.
    NotFound,
}

/// One calendar the engine reads from and writes to.
///
/// Implementations attach the [`Origin`](crate::event::Origin) of every record
/// they return, including the cross-system annotation when the backing store
/// preserved it.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Which calendar this source talks to.
    fn side(&self) -> Side;

    /// List records starting inside `range`.
    ///
    /// An error here means the calendar is unreachable; the pass is aborted.
    async fn list(&self, range: &DateRange) -> SyncResult<Vec<EventRecord>>;

    /// Create a record and return its native identifier.
    async fn create(&self, event: &NewEvent) -> SyncResult<String>;

    /// Delete a record by its native identifier.
    async fn delete(&self, event_id: &str) -> SyncResult<DeleteOutcome>;
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory event source for engine tests.

    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;
    use crate::error::SyncError;
    use crate::event::{EventTime, Origin};

    #[derive(Default)]
    struct Inner {
        records: Vec<EventRecord>,
        failing_titles: HashSet<String>,
        failing_deletes: HashSet<String>,
        vanishing: HashSet<String>,
        unavailable: bool,
        lists_left: Option<usize>,
        next_id: usize,
        creates: usize,
        deletes: usize,
        listed: Vec<DateRange>,
    }

    pub(crate) struct MemorySource {
        side: Side,
        inner: Mutex<Inner>,
    }

    impl MemorySource {
        pub(crate) fn new(side: Side) -> Self {
            MemorySource {
                side,
                inner: Mutex::new(Inner::default()),
            }
        }

        pub(crate) fn with(side: Side, records: Vec<EventRecord>) -> Self {
            let source = Self::new(side);
            source.inner.lock().unwrap().records = records;
            source
        }

        pub(crate) fn insert(&self, record: EventRecord) {
            self.inner.lock().unwrap().records.push(record);
        }

        pub(crate) fn remove(&self, raw_id: &str) {
            self.inner.lock().unwrap().records.retain(|r| r.raw_id != raw_id);
        }

        pub(crate) fn fail_creates_titled(&self, title: &str) {
            self.inner.lock().unwrap().failing_titles.insert(title.to_string());
        }

        pub(crate) fn fail_deletes_of(&self, raw_id: &str) {
            self.inner.lock().unwrap().failing_deletes.insert(raw_id.to_string());
        }

        /// Deletes of `raw_id` report `NotFound`, as if another client removed
        /// it between listing and deleting.
        pub(crate) fn vanish_on_delete(&self, raw_id: &str) {
            self.inner.lock().unwrap().vanishing.insert(raw_id.to_string());
        }

        /// Allow `n` more successful listings, then fail like an outage.
        pub(crate) fn fail_lists_after(&self, n: usize) {
            self.inner.lock().unwrap().lists_left = Some(n);
        }

        pub(crate) fn set_unavailable(&self, unavailable: bool) {
            self.inner.lock().unwrap().unavailable = unavailable;
        }

        pub(crate) fn records(&self) -> Vec<EventRecord> {
            self.inner.lock().unwrap().records.clone()
        }

        pub(crate) fn create_calls(&self) -> usize {
            self.inner.lock().unwrap().creates
        }

        pub(crate) fn delete_calls(&self) -> usize {
            self.inner.lock().unwrap().deletes
        }

        pub(crate) fn listed_ranges(&self) -> Vec<DateRange> {
            self.inner.lock().unwrap().listed.clone()
        }
    }

    #[async_trait]
    impl EventSource for MemorySource {
        fn side(&self) -> Side {
            self.side
        }

        async fn list(&self, range: &DateRange) -> SyncResult<Vec<EventRecord>> {
            let mut inner = self.inner.lock().unwrap();
            let exhausted = inner.lists_left == Some(0);
            if inner.unavailable || exhausted {
                return Err(SyncError::Source {
                    side: self.side,
                    message: "connection refused".to_string(),
                });
            }
            if let Some(left) = inner.lists_left.as_mut() {
                *left -= 1;
            }
            inner.listed.push(range.clone());
            Ok(inner
                .records
                .iter()
                .filter(|r| range.contains(&r.start))
                .cloned()
                .collect())
        }

        async fn create(&self, event: &NewEvent) -> SyncResult<String> {
            let mut inner = self.inner.lock().unwrap();
            inner.creates += 1;
            if inner.failing_titles.contains(&event.summary) {
                return Err(SyncError::Provider("simulated transport error".to_string()));
            }
            inner.next_id += 1;
            let raw_id = format!("{}-{}", self.side, inner.next_id);
            inner.records.push(EventRecord {
                raw_id: raw_id.clone(),
                title: event.summary.clone(),
                description: event.description.clone(),
                start: event.start.clone(),
                end: event.end.clone(),
                recurrence_id: None,
                origin: Origin {
                    system: self.side,
                    foreign_uid: Some(event.origin_uid.clone()),
                },
            });
            Ok(raw_id)
        }

        async fn delete(&self, event_id: &str) -> SyncResult<DeleteOutcome> {
            let mut inner = self.inner.lock().unwrap();
            inner.deletes += 1;
            if inner.failing_deletes.contains(event_id) {
                return Err(SyncError::Provider("simulated delete failure".to_string()));
            }
            if inner.vanishing.contains(event_id) {
                inner.records.retain(|r| r.raw_id != event_id);
                return Ok(DeleteOutcome::NotFound);
            }
            let before = inner.records.len();
            inner.records.retain(|r| r.raw_id != event_id);
            if inner.records.len() < before {
                Ok(DeleteOutcome::Deleted)
            } else {
                Ok(DeleteOutcome::NotFound)
            }
        }
    }

    /// A native record on `side`.
    pub(crate) fn native(side: Side, raw_id: &str, title: &str, start: EventTime, end: EventTime) -> EventRecord {
        EventRecord {
            raw_id: raw_id.to_string(),
            title: title.to_string(),
            description: None,
            start,
            end,
            recurrence_id: None,
            origin: Origin::native(side),
        }
    }
}
