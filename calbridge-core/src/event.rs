//! Provider-neutral event types.
//!
//! Event sources convert whatever their wire format is into these types,
//! and the reconciliation engine works exclusively with them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{self, Key, Provenance};

/// One of the two calendars being kept in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Google,
    Icloud,
}

impl Side {
    /// The calendar on the other end of the bridge.
    pub fn other(self) -> Side {
        match self {
            Side::Google => Side::Icloud,
            Side::Icloud => Side::Google,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Google => write!(f, "Google"),
            Side::Icloud => write!(f, "iCloud"),
        }
    }
}

/// Start or end of an event: either an instant or a whole day.
///
/// Serialized as a single string (`2025-01-10T09:00:00Z` or `2025-01-10`),
/// which is also how it appears in the persisted sync state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl EventTime {
    /// The instant this time refers to. All-day values map to midnight UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// `YYYY-MM-DD`, used in notification summaries.
    pub fn date_label(&self) -> String {
        match self {
            EventTime::DateTime(dt) => dt.format("%Y-%m-%d").to_string(),
            EventTime::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Compact form used to tell recurrence instances apart
    /// (`20250110T090000Z`, or `20250110` for all-day instances).
    pub fn instance_suffix(&self) -> String {
        match self {
            EventTime::DateTime(dt) => dt.format("%Y%m%dT%H%M%SZ").to_string(),
            EventTime::Date(d) => d.format("%Y%m%d").to_string(),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::DateTime(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for EventTime {
    type Err = String;

    /// Accepts RFC 3339, naive ISO datetimes (taken as UTC) and plain dates.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(EventTime::DateTime(dt.with_timezone(&Utc)));
        }

        let naive = s.strip_suffix('Z').unwrap_or(s);
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
                return Ok(EventTime::DateTime(dt.and_utc()));
            }
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(EventTime::Date)
            .map_err(|_| format!("Invalid event time '{}'", s))
    }
}

impl TryFrom<String> for EventTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventTime> for String {
    fn from(time: EventTime) -> Self {
        time.to_string()
    }
}

/// Where a record was fetched from, and which key it was written under if
/// calbridge itself created it there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub system: Side,
    /// Cross-system annotation preserved by the source, if any.
    pub foreign_uid: Option<String>,
}

impl Origin {
    pub fn native(system: Side) -> Self {
        Origin {
            system,
            foreign_uid: None,
        }
    }
}

/// An event as returned by one of the two sources.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Identifier assigned by the source that produced this record.
    pub raw_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    /// Original start of this occurrence, for instances of a recurring event.
    pub recurrence_id: Option<EventTime>,
    pub origin: Origin,
}

impl EventRecord {
    pub fn key(&self) -> Key {
        identity::resolve(self)
    }

    pub fn provenance(&self) -> Provenance {
        identity::provenance(self)
    }
}

/// The representation of a record handed to the opposite source for creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    /// Key of the originating record; sources must hand it back on listing.
    pub origin_uid: String,
}

impl NewEvent {
    pub fn from_record(record: &EventRecord, key: &Key) -> Self {
        NewEvent {
            summary: record.title.clone(),
            description: record.description.clone(),
            start: record.start.clone(),
            end: record.end.clone(),
            origin_uid: key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_time_accepts_rfc3339_with_offset() {
        let time: EventTime = "2025-01-10T10:00:00+01:00".parse().unwrap();
        assert_eq!(
            time,
            EventTime::DateTime(Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap())
        );
        assert_eq!(time.to_string(), "2025-01-10T09:00:00Z");
    }

    #[test]
    fn test_event_time_accepts_naive_and_short_forms() {
        let expected = EventTime::DateTime(Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap());

        // Legacy state files wrote local timestamps without an offset
        let naive: EventTime = "2025-01-10T09:00:00.123456".parse().unwrap();
        assert_eq!(naive.to_utc().timestamp(), expected.to_utc().timestamp());

        assert_eq!("2025-01-10T09:00Z".parse::<EventTime>().unwrap(), expected);
    }

    #[test]
    fn test_event_time_date_only() {
        let time: EventTime = "2025-03-20".parse().unwrap();
        assert_eq!(time, EventTime::Date(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()));
        assert_eq!(time.to_string(), "2025-03-20");
        assert_eq!(time.instance_suffix(), "20250320");
        assert_eq!(time.to_utc(), Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_event_time_rejects_garbage() {
        assert!("unknown".parse::<EventTime>().is_err());
        assert!(serde_json::from_str::<EventTime>("\"not a date\"").is_err());
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Icloud).unwrap(), "\"icloud\"");
        assert_eq!(Side::Google.other(), Side::Icloud);
        assert_eq!(Side::Icloud.to_string(), "iCloud");
    }
}
