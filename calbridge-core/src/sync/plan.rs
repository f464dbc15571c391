//! Pure diffing of calendar snapshots against the sync state.

use std::collections::{HashMap, HashSet};

use crate::date_range::DateRange;
use crate::error::SyncResult;
use crate::event::{EventRecord, Side};
use crate::identity::{Key, Provenance};
use crate::source::EventSource;
use crate::state::SyncState;

/// Records listed from one calendar, indexed by key. Several records can
/// share a key, e.g. duplicate copies left by an interrupted pass.
pub struct Snapshot {
    side: Side,
    records: Vec<EventRecord>,
    by_key: HashMap<Key, Vec<usize>>,
}

impl Snapshot {
    pub fn new(side: Side, records: Vec<EventRecord>) -> Self {
        let mut by_key: HashMap<Key, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            by_key.entry(record.key()).or_default().push(i);
        }
        Snapshot {
            side,
            records,
            by_key,
        }
    }

    pub async fn fetch(source: &dyn EventSource, range: &DateRange) -> SyncResult<Self> {
        let records = source.list(range).await?;
        Ok(Snapshot::new(source.side(), records))
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.by_key.contains_key(key)
    }

    /// First record listed under `key`.
    pub fn get(&self, key: &Key) -> Option<&EventRecord> {
        self.get_all(key).next()
    }

    /// Every record listed under `key`, in listing order.
    pub fn get_all<'s>(&'s self, key: &Key) -> impl Iterator<Item = &'s EventRecord> + use<'s> {
        self.by_key
            .get(key)
            .into_iter()
            .flatten()
            .map(|&i| &self.records[i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationAction {
    Create,
    /// The other calendar already has it; only record the entry.
    AlreadyExists,
}

/// A native record that has never been synced.
#[derive(Debug)]
pub struct Propagation<'a> {
    pub key: Key,
    pub record: &'a EventRecord,
    pub action: PropagationAction,
}

/// Native records of `source` not yet tracked in `state`, each paired with
/// whether `target` needs it created.
pub fn plan_propagation<'a>(
    source: &'a Snapshot,
    target: &Snapshot,
    state: &SyncState,
) -> Vec<Propagation<'a>> {
    let mut seen = HashSet::new();
    let mut plan = Vec::new();

    for record in source.records() {
        if record.provenance() == Provenance::Foreign {
            continue;
        }

        let key = record.key();
        if state.contains(&key) || !seen.insert(key.clone()) {
            continue;
        }

        let action = if target.contains(&key) {
            PropagationAction::AlreadyExists
        } else {
            PropagationAction::Create
        };

        plan.push(Propagation {
            key,
            record,
            action,
        });
    }

    plan
}

/// Keys that originated on `source`, start inside `window`, and are no
/// longer listed there.
pub fn plan_deletions(source: &Snapshot, state: &SyncState, window: &DateRange) -> Vec<Key> {
    state
        .entries
        .iter()
        .filter(|(key, entry)| {
            entry.source == source.side()
                && window.contains(&entry.start)
                && !source.contains(key)
        })
        .map(|(key, _)| key.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventTime, Origin};
    use crate::source::memory::native;
    use crate::state::SyncedEntry;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap()
    }

    fn at(offset_days: i64) -> EventTime {
        EventTime::DateTime(now() + Duration::days(offset_days))
    }

    fn foreign(side: Side, raw_id: &str, origin_uid: &str) -> EventRecord {
        EventRecord {
            origin: Origin {
                system: side,
                foreign_uid: Some(origin_uid.to_string()),
            },
            ..native(side, raw_id, "Copy", at(1), at(1))
        }
    }

    fn tracked(state: &mut SyncState, key: &str, source: Side, start: EventTime) {
        state
            .entries
            .insert(Key::from(key), SyncedEntry::synced(key, source, start, now()));
    }

    #[test]
    fn test_plan_propagation_skips_tracked_foreign_and_duplicates() {
        let google = Snapshot::new(
            Side::Google,
            vec![
                native(Side::Google, "new", "New", at(1), at(1)),
                native(Side::Google, "tracked", "Tracked", at(2), at(2)),
                foreign(Side::Google, "g-copy", "u1"),
                native(Side::Google, "new", "New again", at(1), at(1)),
                native(Side::Google, "present", "Present", at(3), at(3)),
            ],
        );
        let icloud = Snapshot::new(Side::Icloud, vec![foreign(Side::Icloud, "u9", "present")]);

        let mut state = SyncState::default();
        tracked(&mut state, "tracked", Side::Google, at(2));

        let plan = plan_propagation(&google, &icloud, &state);
        let summary: Vec<_> = plan
            .iter()
            .map(|p| (p.key.as_str(), p.record.title.as_str(), p.action))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("new", "New", PropagationAction::Create),
                ("present", "Present", PropagationAction::AlreadyExists),
            ]
        );
    }

    #[test]
    fn test_plan_deletions_respects_side_window_and_presence() {
        let google = Snapshot::new(
            Side::Google,
            vec![native(Side::Google, "still-there", "x", at(1), at(1))],
        );

        let mut state = SyncState::default();
        tracked(&mut state, "still-there", Side::Google, at(1));
        tracked(&mut state, "deleted", Side::Google, at(5));
        tracked(&mut state, "far-future", Side::Google, at(200));
        tracked(&mut state, "long-past", Side::Google, at(-30));
        tracked(&mut state, "from-icloud", Side::Icloud, at(5));

        let doomed = plan_deletions(&google, &state, &DateRange::active(now()));
        assert_eq!(doomed, vec![Key::from("deleted")]);
    }

    #[test]
    fn test_snapshot_indexes_by_resolved_key() {
        let snapshot = Snapshot::new(Side::Icloud, vec![foreign(Side::Icloud, "u1", "g1")]);
        assert!(snapshot.contains(&Key::from("g1")));
        assert!(!snapshot.contains(&Key::from("u1")));
        assert_eq!(snapshot.get(&Key::from("g1")).map(|r| r.raw_id.as_str()), Some("u1"));
    }

    #[test]
    fn test_snapshot_keeps_every_record_sharing_a_key() {
        let snapshot = Snapshot::new(
            Side::Icloud,
            vec![
                foreign(Side::Icloud, "c1", "e1"),
                native(Side::Icloud, "other", "Other", at(1), at(1)),
                foreign(Side::Icloud, "c2", "e1"),
            ],
        );

        let ids: Vec<_> = snapshot
            .get_all(&Key::from("e1"))
            .map(|r| r.raw_id.as_str())
            .collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(snapshot.get(&Key::from("e1")).map(|r| r.raw_id.as_str()), Some("c1"));
        assert_eq!(snapshot.get_all(&Key::from("missing")).count(), 0);
    }
}
