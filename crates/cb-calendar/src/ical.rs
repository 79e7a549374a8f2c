//! iCalendar reading and writing, VEVENT only
//!
//! Times with a `TZID` parameter and floating times are read in the
//! configured offset. Recurrence rules are ignored; only the first VEVENT of
//! a resource is read.

use cb_core::{Event, Instant, Interval};
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use icalendar::parser::{read_calendar, unfold, Component as ParsedComponent};
use icalendar::{Calendar, CalendarDateTime, Component, DatePerhapsTime, EventLike, Property, ValueType};

use crate::error::{CalendarError, Result};

/// A VEVENT plus the scheduling flags the core model does not carry
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvent {
    pub event: Event,
    /// `TRANSP:TRANSPARENT` events do not block time
    pub transparent: bool,
}

impl ParsedEvent {
    /// Whether the event occupies time for free/busy purposes
    pub fn is_busy(&self) -> bool {
        !self.transparent && !self.event.all_day
    }
}

/// Parse the first VEVENT in an iCalendar document
pub fn parse_vevent(ical: &str, offset: FixedOffset) -> Result<ParsedEvent> {
    let unfolded = unfold(ical);
    let calendar = read_calendar(&unfolded).map_err(|e| CalendarError::ICalParse(e.to_string()))?;
    let vevent = calendar
        .components
        .iter()
        .flat_map(|c| std::iter::once(c).chain(c.components.iter()))
        .find(|c| c.name == "VEVENT")
        .ok_or_else(|| CalendarError::ICalParse("no VEVENT in resource".to_string()))?;

    let text = |name: &str| {
        vevent
            .find_prop(name)
            .map(|p| p.val.to_string())
            .filter(|v| !v.is_empty())
    };

    let (start, all_day) = time_prop(vevent, "DTSTART", offset)
        .ok_or_else(|| CalendarError::ICalParse("VEVENT without DTSTART".to_string()))?;
    let end = match time_prop(vevent, "DTEND", offset) {
        Some((end, _)) => end,
        None => match duration_prop(vevent) {
            Some(length) => start
                .checked_add_signed(length)
                .ok_or_else(|| CalendarError::ICalParse("DURATION out of range".to_string()))?,
            None if all_day => start + Duration::days(1),
            None => start,
        },
    };
    let interval = Interval::new(start, end).map_err(|e| CalendarError::ICalParse(e.to_string()))?;

    let transparent = vevent
        .find_prop("TRANSP")
        .is_some_and(|p| p.val.as_ref().trim().eq_ignore_ascii_case("TRANSPARENT"));

    let mut event = Event::new(text("SUMMARY").unwrap_or_default(), interval);
    event.id = text("UID");
    event.description = text("DESCRIPTION");
    event.location = text("LOCATION");
    event.all_day = all_day;

    Ok(ParsedEvent { event, transparent })
}

/// Serialize an event as a single-VEVENT calendar
pub fn to_ical(event: &Event, uid: &str, stamp: DateTime<Utc>) -> String {
    let mut vevent = icalendar::Event::new();
    vevent.uid(uid);
    vevent.summary(&event.title);
    vevent.add_property("DTSTAMP", stamp.format("%Y%m%dT%H%M%SZ").to_string());

    if event.all_day {
        add_date(&mut vevent, "DTSTART", event.start());
        add_date(&mut vevent, "DTEND", event.end());
    } else {
        vevent.add_property("DTSTART", utc_stamp(event.start()));
        vevent.add_property("DTEND", utc_stamp(event.end()));
    }

    if let Some(ref desc) = event.description {
        vevent.description(desc);
    }
    if let Some(ref loc) = event.location {
        vevent.location(loc);
    }

    let mut calendar = Calendar::new();
    calendar.push(vevent.done());
    calendar.done().to_string()
}

fn add_date(vevent: &mut icalendar::Event, name: &str, instant: Instant) {
    let mut prop = Property::new(name, instant.format("%Y%m%d").to_string());
    prop.append_parameter(ValueType::Date);
    vevent.append_property(prop);
}

fn utc_stamp(instant: Instant) -> String {
    instant.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ").to_string()
}

/// `(instant, is_date_only)` for a DTSTART/DTEND property
fn time_prop(vevent: &ParsedComponent<'_>, name: &str, offset: FixedOffset) -> Option<(Instant, bool)> {
    let value = DatePerhapsTime::try_from(vevent.find_prop(name)?).ok()?;
    match value {
        DatePerhapsTime::Date(date) => {
            let midnight = offset.from_local_datetime(&date.and_time(NaiveTime::MIN)).single()?;
            Some((midnight, true))
        }
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(utc)) => Some((utc.with_timezone(&offset), false)),
        // no tz database; zoned and floating times are read in the configured offset
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive))
        | DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time: naive, .. }) => {
            Some((offset.from_local_datetime(&naive).single()?, false))
        }
    }
}

/// Positive `DURATION` value, e.g. `PT1H30M`
fn duration_prop(vevent: &ParsedComponent<'_>) -> Option<Duration> {
    let value = vevent.find_prop("DURATION")?.val.as_ref().trim().trim_start_matches('+').to_string();
    let parsed = iso8601::duration(&value).ok()?;
    let std_duration: std::time::Duration = parsed.into();
    Duration::from_std(std_duration).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_core::schedule::{free_slots, WorkingHours};
    use chrono::{NaiveDate, Timelike};

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn wrap(vevent: &str) -> String {
        format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\n{}END:VCALENDAR\r\n", vevent)
    }

    const SAMPLE: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\nBEGIN:VEVENT\r\nUID:abc-123\r\nSUMMARY:Design review\r\nDESCRIPTION:first line and a description that is\r\n  folded\r\nLOCATION:Room 3\r\nDTSTART:20240115T053000Z\r\nDTEND:20240115T063000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    #[test]
    fn test_parse_utc_event_into_offset() {
        let parsed = parse_vevent(SAMPLE, kst()).unwrap();
        assert!(parsed.is_busy());

        let event = &parsed.event;
        assert_eq!(event.id.as_deref(), Some("abc-123"));
        assert_eq!(event.title, "Design review");
        assert_eq!(
            event.description.as_deref(),
            Some("first line and a description that is folded")
        );
        assert_eq!(event.location.as_deref(), Some("Room 3"));
        assert_eq!(event.start().format("%H:%M").to_string(), "14:30");
        assert_eq!(event.end().format("%H:%M").to_string(), "15:30");
    }

    #[test]
    fn test_parse_duration_sets_end() {
        let ical = wrap("BEGIN:VEVENT\r\nUID:d1\r\nSUMMARY:Workshop\r\nDTSTART:20240115T010000Z\r\nDURATION:PT2H\r\nEND:VEVENT\r\n");
        let parsed = parse_vevent(&ical, kst()).unwrap();
        assert_eq!(parsed.event.start(), kst().with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap());
        assert_eq!(parsed.event.end(), kst().with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
        assert!(parsed.is_busy());

        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let slots = free_slots(day, &[parsed.event.interval], WorkingHours::default(), kst()).unwrap();
        let hours: Vec<(u32, u32)> = slots.slots().iter().map(|s| (s.start().hour(), s.end().hour())).collect();
        assert_eq!(hours, vec![(9, 10), (12, 19)]);
    }

    #[test]
    fn test_parse_all_day_and_transparent() {
        let ical = wrap("BEGIN:VEVENT\r\nUID:h1\r\nSUMMARY:Holiday\r\nDTSTART;VALUE=DATE:20240115\r\nTRANSP:TRANSPARENT\r\nEND:VEVENT\r\n");
        let parsed = parse_vevent(&ical, kst()).unwrap();
        assert!(parsed.event.all_day);
        assert!(parsed.transparent);
        assert!(!parsed.is_busy());
        assert_eq!(parsed.event.interval.duration(), Duration::days(1));
    }

    #[test]
    fn test_parse_tzid_time_uses_offset() {
        let ical = wrap("BEGIN:VEVENT\r\nUID:t1\r\nSUMMARY:Local\r\nDTSTART;TZID=Asia/Seoul:20240115T090000\r\nDTEND;TZID=Asia/Seoul:20240115T100000\r\nEND:VEVENT\r\n");
        let parsed = parse_vevent(&ical, kst()).unwrap();
        assert_eq!(parsed.event.start(), kst().with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap());
        assert!(!parsed.event.all_day);
    }

    #[test]
    fn test_parse_rejects_missing_start() {
        let ical = wrap("BEGIN:VEVENT\r\nUID:x\r\nSUMMARY:No start\r\nEND:VEVENT\r\n");
        assert!(parse_vevent(&ical, kst()).is_err());
    }

    #[test]
    fn test_to_ical_is_readable_back() {
        let start = kst().with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
        let event = Event::new("Team Sync", Interval::starting_at(start, Duration::hours(1)).unwrap())
            .with_location("Room 3");
        let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let ical = to_ical(&event, "uid-1", stamp);
        assert!(ical.contains("DTSTART:20240115T050000Z"));
        assert!(ical.contains("DTSTAMP:20240101T000000Z"));
        assert!(ical.contains("UID:uid-1"));

        let parsed = parse_vevent(&ical, kst()).unwrap();
        assert_eq!(parsed.event.title, "Team Sync");
        assert_eq!(parsed.event.start(), start);
        assert_eq!(parsed.event.end(), start + Duration::hours(1));
        assert_eq!(parsed.event.location.as_deref(), Some("Room 3"));
        assert_eq!(parsed.event.id.as_deref(), Some("uid-1"));
    }

    #[test]
    fn test_to_ical_all_day_uses_dates() {
        let midnight = kst().with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let mut event = Event::new("Offsite", Interval::starting_at(midnight, Duration::days(1)).unwrap());
        event.all_day = true;

        let ical = to_ical(&event, "uid-2", Utc::now());
        assert!(ical.contains("DTSTART;VALUE=DATE:20240115"));
        assert!(ical.contains("DTEND;VALUE=DATE:20240116"));

        let parsed = parse_vevent(&ical, kst()).unwrap();
        assert!(parsed.event.all_day);
        assert_eq!(parsed.event.start(), midnight);
    }
}
