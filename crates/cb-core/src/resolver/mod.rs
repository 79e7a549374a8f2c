//! Date/time resolution
//!
//! Turns loosely written date and time text into [`DateSpec`]s and
//! [`Instant`]s. Rules are tried in a fixed order:
//!
//! 1. `YYYY-MM-DD` with an optional `HH:MM`
//! 2. symbolic day words from the [`LocaleTable`] (`today`, `내일`, ...)
//! 3. partial numbers: `MM-DD`, `MM/DD`, bare `HH:MM`
//! 4. free text with a day word and an hour (`tomorrow 3 afternoon`)
//!
//! The reference instant is always passed in, so resolution never reads the
//! wall clock. The hour of free text is the first integer in it; strings with
//! several numbers are not disambiguated further.

mod locale;

pub use locale::{CommandWords, DayToken, LocaleConfig, LocaleTable};

use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::{DateSpec, Instant};

/// What to use when text cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Reference plus one hour (new events)
    OneHourLater,
    /// The reference itself (queries)
    Reference,
}

impl Fallback {
    fn apply(self, now: &Instant) -> Instant {
        match self {
            Self::OneHourLater => *now + Duration::hours(1),
            Self::Reference => *now,
        }
    }
}

/// A resolved value, flagged when it came from a fallback default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Resolution<T> {
    fn parsed(value: T) -> Self {
        Self {
            value,
            defaulted: false,
        }
    }

    fn defaulted(value: T) -> Self {
        Self {
            value,
            defaulted: true,
        }
    }
}

struct Patterns {
    date: Regex,
    date_time: Regex,
    month_day: Regex,
    clock: Regex,
    hour: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        // 2024-01-15
        date: Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap(),
        // 2024-01-15 14:00
        date_time: Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})\s+(\d{1,2}):(\d{2})$").unwrap(),
        // 01-15 or 1/15
        month_day: Regex::new(r"^(\d{1,2})[-/](\d{1,2})$").unwrap(),
        // 14:00
        clock: Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap(),
        // first integer, with minutes when written as 3:30
        hour: Regex::new(r"(\d+)(?::(\d{2}))?").unwrap(),
    })
}

/// Parses date/time text against an injected reference instant
#[derive(Debug, Clone, Default)]
pub struct DateTimeResolver {
    locale: LocaleTable,
}

impl DateTimeResolver {
    pub fn new(locale: LocaleTable) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> &LocaleTable {
        &self.locale
    }

    /// Resolve a date word or number into a [`DateSpec`]
    pub fn resolve_date(&self, text: &str, now: &Instant) -> Result<DateSpec> {
        let text = text.trim();
        let p = patterns();

        if let Some(caps) = p.date.captures(text) {
            return ymd(&caps[1], &caps[2], &caps[3], text).map(DateSpec::Literal);
        }

        if let Some(day) = self.locale.day_exact(text) {
            return Ok(DateSpec::Relative(day));
        }

        if let Some(caps) = p.month_day.captures(text) {
            let year = now.year().to_string();
            return ymd(&year, &caps[1], &caps[2], text).map(DateSpec::Literal);
        }

        Err(Error::Parse(text.to_string()))
    }

    /// Resolve a time of day: `HH:MM`, or an hour with optional AM/PM markers
    pub fn resolve_time(&self, text: &str) -> Result<NaiveTime> {
        let text = text.trim();

        if let Some(caps) = patterns().clock.captures(text) {
            return hm(&caps[1], Some(&caps[2]), text);
        }

        self.hour_in(text)
            .unwrap_or_else(|| Err(Error::Parse(text.to_string())))
    }

    /// Resolve separate date and time text into one instant
    pub fn resolve_datetime(&self, date_text: &str, time_text: &str, now: &Instant) -> Result<Instant> {
        let date = self.resolve_date(date_text, now)?.resolve(now);
        let time = self.resolve_time(time_text)?;
        at(date, time, now)
    }

    /// Resolve a single free-form expression into an instant
    pub fn resolve_relative(&self, text: &str, now: &Instant) -> Result<Instant> {
        let text = text.trim();
        let p = patterns();

        if let Some(caps) = p.date_time.captures(text) {
            let date = ymd(&caps[1], &caps[2], &caps[3], text)?;
            let time = hm(&caps[4], Some(&caps[5]), text)?;
            return at(date, time, now);
        }

        if let Some(caps) = p.date.captures(text) {
            let date = ymd(&caps[1], &caps[2], &caps[3], text)?;
            return at(date, NaiveTime::MIN, now);
        }

        if let Some(day) = self.locale.day_exact(text) {
            return Ok(*now + Duration::days(day.offset_days()));
        }

        if let Some(caps) = p.month_day.captures(text) {
            let date = ymd(&now.year().to_string(), &caps[1], &caps[2], text)?;
            return at(date, NaiveTime::MIN, now);
        }

        if let Some(caps) = p.clock.captures(text) {
            let time = hm(&caps[1], Some(&caps[2]), text)?;
            return at(now.date_naive(), time, now);
        }

        if let Some(day) = self.locale.day_within(text) {
            let shifted = *now + Duration::days(day.offset_days());
            return match self.hour_in(text) {
                Some(time) => at(shifted.date_naive(), time?, now),
                None => Ok(shifted),
            };
        }

        Err(Error::Parse(text.to_string()))
    }

    /// [`resolve_date`](Self::resolve_date) pinned to a date, falling back to
    /// the reference date
    pub fn date_or_default(&self, text: &str, now: &Instant) -> Resolution<NaiveDate> {
        match self.resolve_date(text, now) {
            Ok(spec) => Resolution::parsed(spec.resolve(now)),
            Err(e) => {
                let date = now.date_naive();
                warn!("Parse failure ({}), using reference date {}", e, date);
                Resolution::defaulted(date)
            }
        }
    }

    /// [`resolve_datetime`](Self::resolve_datetime) with a fallback default
    pub fn datetime_or_default(
        &self,
        date_text: &str,
        time_text: &str,
        now: &Instant,
        fallback: Fallback,
    ) -> Resolution<Instant> {
        match self.resolve_datetime(date_text, time_text, now) {
            Ok(instant) => Resolution::parsed(instant),
            Err(e) => {
                let instant = fallback.apply(now);
                warn!("Parse failure ({}), using default {}", e, instant);
                Resolution::defaulted(instant)
            }
        }
    }

    /// [`resolve_relative`](Self::resolve_relative) with a fallback default
    pub fn relative_or_default(&self, text: &str, now: &Instant, fallback: Fallback) -> Resolution<Instant> {
        match self.resolve_relative(text, now) {
            Ok(instant) => Resolution::parsed(instant),
            Err(e) => {
                let instant = fallback.apply(now);
                warn!("Parse failure ({}), using default {}", e, instant);
                Resolution::defaulted(instant)
            }
        }
    }

    /// First integer in `text` read as an hour, adjusted by AM/PM markers.
    /// `None` when the text holds no integer at all.
    fn hour_in(&self, text: &str) -> Option<Result<NaiveTime>> {
        let caps = patterns().hour.captures(text)?;
        let Ok(mut hour) = caps[1].parse::<u32>() else {
            return Some(Err(Error::Parse(text.to_string())));
        };

        if self.locale.has_afternoon_marker(text) {
            if hour < 12 {
                hour += 12;
            }
        } else if self.locale.has_morning_marker(text) && hour == 12 {
            hour = 0;
        }

        let minute = caps.get(2).map(|m| m.as_str());
        Some(hm(&hour.to_string(), minute, text))
    }
}

fn ymd(year: &str, month: &str, day: &str, source: &str) -> Result<NaiveDate> {
    let parse_err = || Error::Parse(source.to_string());
    let year = year.parse().map_err(|_| parse_err())?;
    let month = month.parse().map_err(|_| parse_err())?;
    let day = day.parse().map_err(|_| parse_err())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(parse_err)
}

fn hm(hour: &str, minute: Option<&str>, source: &str) -> Result<NaiveTime> {
    let parse_err = || Error::Parse(source.to_string());
    let hour = hour.parse().map_err(|_| parse_err())?;
    let minute = match minute {
        Some(m) => m.parse().map_err(|_| parse_err())?,
        None => 0,
    };
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(parse_err)
}

/// Civil date and time in the reference instant's offset
fn at(date: NaiveDate, time: NaiveTime, now: &Instant) -> Result<Instant> {
    date.and_time(time)
        .and_local_timezone(*now.offset())
        .single()
        .ok_or_else(|| Error::Parse(format!("{} {}", date, time)))
}
