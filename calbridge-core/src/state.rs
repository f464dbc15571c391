//! Persisted correspondence table between the two calendars.
//!
//! The whole state lives in one JSON document that is read once at the start
//! of a pass and rewritten once at the end.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::event::{EventTime, Side};
use crate::identity::Key;

/// Last known synchronization status of one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedEntry {
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    /// Calendar the event was first seen on.
    pub source: Side,
    pub start: EventTime,
    #[serde(with = "timestamp")]
    pub synced_at: DateTime<Utc>,
    #[serde(default)]
    pub sync_failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncedEntry {
    pub fn synced(title: &str, source: Side, start: EventTime, at: DateTime<Utc>) -> Self {
        SyncedEntry {
            title: title.to_string(),
            source,
            start,
            synced_at: at,
            sync_failed: false,
            error: None,
        }
    }

    pub fn failed(title: &str, source: Side, start: EventTime, at: DateTime<Utc>, error: String) -> Self {
        SyncedEntry {
            sync_failed: true,
            error: Some(error),
            ..SyncedEntry::synced(title, source, start, at)
        }
    }
}

/// Snapshot of everything calbridge remembers between passes.
///
/// A pass never edits the snapshot it was given; it produces a new one with
/// `version` bumped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// Number of passes that produced this snapshot. Absent in legacy files.
    #[serde(default)]
    pub version: u64,
    #[serde(default, with = "timestamp::option")]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(rename = "synced_events", default)]
    pub entries: BTreeMap<Key, SyncedEntry>,
}

impl SyncState {
    pub fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn failed_entries(&self) -> impl Iterator<Item = (&Key, &SyncedEntry)> {
        self.entries.iter().filter(|(_, entry)| entry.sync_failed)
    }

    pub fn count_from(&self, side: Side) -> usize {
        self.entries.values().filter(|e| e.source == side).count()
    }

    /// Copy of this state with every failed entry dropped, so the next pass
    /// treats those events as never seen.
    pub fn without_failed(&self) -> SyncState {
        SyncState {
            entries: self
                .entries
                .iter()
                .filter(|(_, entry)| !entry.sync_failed)
                .map(|(key, entry)| (key.clone(), entry.clone()))
                .collect(),
            ..self.clone()
        }
    }
}

/// JSON file holding the [`SyncState`].
///
/// Not safe for concurrent writers; calbridge runs one pass at a time.
#[derive(Debug, Clone)]
pub struct SyncStateStore {
    path: PathBuf,
}

impl SyncStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SyncStateStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state, or an empty one if nothing has been saved yet.
    pub fn load(&self) -> SyncResult<SyncState> {
        if !self.path.exists() {
            return Ok(SyncState::default());
        }

        let content = std::fs::read_to_string(&self.path)?;

        serde_json::from_str(&content).map_err(|e| {
            SyncError::State(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    /// Replace the stored state. Written to a temp file first, then renamed.
    pub fn save(&self, state: &SyncState) -> SyncResult<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let content = serde_json::to_string_pretty(state)
            .map_err(|e| SyncError::Serialization(e.to_string()))?;

        let temp = self.temp_path();
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "sync_state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamps are written as RFC 3339; naive ISO strings from older files are
/// read as UTC.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    use crate::event::EventTime;

    fn parse<E: de::Error>(s: &str) -> Result<DateTime<Utc>, E> {
        s.parse::<EventTime>()
            .map(|t| t.to_utc())
            .map_err(E::custom)
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(s) => parse(&s).map(Some),
                None => Ok(None),
            }
        }
    }
}
