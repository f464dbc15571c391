//! Cross-system event identity.
//!
//! A [`Key`] names one logical event occurrence regardless of which calendar
//! a record was read from. Records written by calbridge carry the key of the
//! record they were copied from, so both copies resolve to the same key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::EventRecord;

/// Canonical cross-system identity of an event occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Key(key.to_string())
    }
}

/// Whether a record was authored on the calendar it was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Native,
    /// Written there by a previous pass; must not be propagated back.
    Foreign,
}

/// Classify a record by its origin annotation.
///
/// Foreign only when the source preserved an annotation that differs from the
/// record's own identifier. The comparison is exact.
pub fn provenance(record: &EventRecord) -> Provenance {
    match record.origin.foreign_uid.as_deref() {
        Some(uid) if !uid.is_empty() && uid != record.raw_id => Provenance::Foreign,
        _ => Provenance::Native,
    }
}

/// Compute the cross-system key for a record.
///
/// Foreign records resolve to the key they were written under. Native records
/// resolve to their identifier, with `_<instance>` appended for occurrences of
/// a recurring event unless the identifier already ends with it (Google
/// instance ids do, iCloud UIDs do not).
pub fn resolve(record: &EventRecord) -> Key {
    if provenance(record) == Provenance::Foreign {
        if let Some(uid) = &record.origin.foreign_uid {
            return Key(uid.clone());
        }
    }

    let base = record.raw_id.as_str();

    match &record.recurrence_id {
        Some(instance) => {
            let suffix = format!("_{}", instance.instance_suffix());
            if base.ends_with(&suffix) {
                Key(base.to_string())
            } else {
                Key(format!("{base}{suffix}"))
            }
        }
        None => Key(base.to_string()),
    }
}
