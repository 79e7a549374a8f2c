//! Command and outcome types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schedule::FreeSlots;
use crate::types::Event;

/// Purpose of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ListEvents,
    AddEvent,
    DeleteEvent,
    QueryFreeTime,
    HealthCheck,
    Unknown,
}

/// Arguments pulled out of a command, still as raw text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandArgs {
    #[serde(default)]
    pub date: Option<String>,
    /// Time of day, or a whole free-form expression when `date` is absent
    #[serde(default, alias = "datetime")]
    pub time: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
}

impl CommandArgs {
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }
}

/// A classified command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub raw: String,
    pub intent: Intent,
    pub args: CommandArgs,
}

/// Structured result of executing an intent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Events {
        /// First listed day
        date: NaiveDate,
        /// Number of consecutive days listed
        days: u32,
        /// The date text was not understood and today was used
        date_defaulted: bool,
        events: Vec<Event>,
    },
    Added {
        event: Event,
        /// Events that overlapped the new one when it was created
        conflicts: Vec<Event>,
        /// The date/time text was not understood and a default was used
        time_defaulted: bool,
    },
    Deleted {
        event_id: String,
    },
    FreeTime {
        date: NaiveDate,
        date_defaulted: bool,
        slots: FreeSlots,
    },
    Health {
        calendar_name: String,
    },
    Unknown,
}
