use super::time::{self, Timestamp};
use serde::{Deserialize, Serialize};

pub type EventId = i64;
pub type StageId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCreate {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// First stage start and last stage end of an event, as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDuration {
    #[serde(with = "time::wire")]
    pub start_time: Timestamp,
    #[serde(with = "time::wire")]
    pub end_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub event_id: EventId,
    #[serde(with = "time::wire")]
    pub start_time: Timestamp,
    #[serde(with = "time::wire")]
    pub end_time: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageCreate {
    #[serde(with = "time::wire")]
    pub start_time: Timestamp,
    #[serde(with = "time::wire")]
    pub end_time: Timestamp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageUpdate {
    #[serde(
        default,
        with = "time::wire::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<Timestamp>,
    #[serde(
        default,
        with = "time::wire::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<Timestamp>,
}

impl Stage {
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}
