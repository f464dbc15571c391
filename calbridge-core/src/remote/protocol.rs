//! Defines the JSON protocol used for communication between calbridge
//! and provider binaries over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::constants::DEFAULT_EVENT_TITLE;
use crate::event::{EventRecord, EventTime, NewEvent, Origin, Side};
use crate::source::DeleteOutcome;

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListEvents,
    CreateEvent,
    DeleteEvent,
}

/// Request sent from calbridge to provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from provider to calbridge.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

/// An event as a provider lists it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEvent {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default)]
    pub recurrence_id: Option<EventTime>,
    /// Key stored on the event when calbridge created it.
    #[serde(default)]
    pub origin_uid: Option<String>,
}

impl WireEvent {
    pub fn into_record(self, side: Side) -> EventRecord {
        EventRecord {
            raw_id: self.id,
            title: self
                .summary
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT_TITLE.to_string()),
            description: self.description,
            start: self.start,
            end: self.end,
            recurrence_id: self.recurrence_id,
            origin: Origin {
                system: side,
                foreign_uid: self.origin_uid,
            },
        }
    }
}

/// List events within a time range.
///
/// Elements of the response are kept as raw JSON so one malformed event does
/// not spoil the whole listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    /// Provider-specific config (e.g., google_account, google_calendar_id)
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub from: String,
    pub to: String,
}

impl ProviderCommand for ListEvents {
    type Response = Vec<serde_json::Value>;
    fn command() -> Command {
        Command::ListEvents
    }
}

/// Create a new event.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event: NewEvent,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
}

impl ProviderCommand for CreateEvent {
    type Response = CreatedEvent;
    fn command() -> Command {
        Command::CreateEvent
    }
}

/// Delete an event by ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event_id: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = DeleteOutcome;
    fn command() -> Command {
        Command::DeleteEvent
    }
}
