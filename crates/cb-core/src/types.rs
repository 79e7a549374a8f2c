//! Calendar data model
//!
//! All instants carry the single configured UTC offset; nothing in the core
//! converts between zones.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, SubsecRound};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A point in time in the configured zone
pub type Instant = DateTime<FixedOffset>;

/// A `[start, end)` span of time with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    start: Instant,
    end: Instant,
}

impl Interval {
    /// Create an interval, rejecting `start > end`
    pub fn new(start: Instant, end: Instant) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidInterval {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Create an interval starting at `start` and lasting `duration`
    pub fn starting_at(start: Instant, duration: Duration) -> Result<Self> {
        let end = start
            .checked_add_signed(duration)
            .ok_or_else(|| Error::InvalidInterval {
                start: start.to_rfc3339(),
                end: format!("{} + {}", start.to_rfc3339(), duration),
            })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn end(&self) -> Instant {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open overlap test; intervals that only touch do not overlap
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether a listing of `window` shows this interval: it overlaps the
    /// window, or it is a point in time inside it
    pub fn falls_in(&self, window: &Interval) -> bool {
        self.overlaps(window) || (window.start <= self.start && self.start < window.end)
    }

    /// Same interval with sub-second parts dropped
    pub fn to_seconds(&self) -> Self {
        Self {
            start: self.start.trunc_subsecs(0),
            end: self.end.trunc_subsecs(0),
        }
    }

    /// `HH:MM - HH:MM` in the interval's own offset
    pub fn format_hm(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// A calendar event as seen by the core
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Provider-assigned identifier; `None` until the event is created
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(flatten)]
    pub interval: Interval,
    /// All-day events render without a time of day
    pub all_day: bool,
}

impl Event {
    /// Create a new, not yet persisted event
    pub fn new(title: impl Into<String>, interval: Interval) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            location: None,
            interval,
            all_day: false,
        }
    }

    /// Set the provider identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Mark as an all-day event
    pub fn all_day(mut self) -> Self {
        self.all_day = true;
        self
    }

    pub fn start(&self) -> Instant {
        self.interval.start()
    }

    pub fn end(&self) -> Instant {
        self.interval.end()
    }
}

/// Symbolic day terms understood by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeDay {
    Today,
    Tomorrow,
    DayAfterTomorrow,
    /// Anchored on the reference date
    ThisWeek,
    NextWeek,
}

impl RelativeDay {
    /// Offset from the reference date in days
    pub fn offset_days(self) -> i64 {
        match self {
            Self::Today | Self::ThisWeek => 0,
            Self::Tomorrow => 1,
            Self::DayAfterTomorrow => 2,
            Self::NextWeek => 7,
        }
    }
}

/// A date as written by the user, before it is pinned to a reference instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    Literal(NaiveDate),
    Relative(RelativeDay),
}

impl DateSpec {
    /// Pin to a civil date using `reference` as "now"
    pub fn resolve(&self, reference: &Instant) -> NaiveDate {
        match self {
            Self::Literal(date) => *date,
            Self::Relative(day) => reference.date_naive() + Duration::days(day.offset_days()),
        }
    }
}
