//! Free time within working hours
//!
//! Sweeps the busy intervals of one day in start order and emits the gaps
//! between them. Overlapping, nested and unsorted busy intervals are fine:
//! the cursor only ever moves forward.

use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Instant, Interval};

/// Working day bounds as whole hours, `start_hour < end_hour <= 24`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 19,
        }
    }
}

impl WorkingHours {
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self> {
        let hours = Self {
            start_hour,
            end_hour,
        };
        hours.validate()?;
        Ok(hours)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_hour >= self.end_hour || self.end_hour > 24 {
            return Err(Error::Config(format!(
                "working hours must satisfy start < end <= 24, got {}-{}",
                self.start_hour, self.end_hour
            )));
        }
        Ok(())
    }

    /// The working part of `day` in the given offset
    pub fn span(&self, day: NaiveDate, offset: FixedOffset) -> Result<Interval> {
        self.validate()?;
        let midnight = day
            .and_time(NaiveTime::MIN)
            .and_local_timezone(offset)
            .single()
            .ok_or_else(|| Error::Config(format!("cannot place {} in {}", day, offset)))?;
        Interval::new(
            midnight + Duration::hours(self.start_hour.into()),
            midnight + Duration::hours(self.end_hour.into()),
        )
    }
}

/// Result of a free-time query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "slots", rename_all = "snake_case")]
pub enum FreeSlots {
    /// At least one free interval, in start order
    Available(Vec<Interval>),
    /// Busy intervals cover the whole working day
    FullyBooked,
}

impl FreeSlots {
    pub fn is_fully_booked(&self) -> bool {
        matches!(self, Self::FullyBooked)
    }

    /// Free intervals; empty only when fully booked
    pub fn slots(&self) -> &[Interval] {
        match self {
            Self::Available(slots) => slots,
            Self::FullyBooked => &[],
        }
    }
}

/// Compute the free intervals of `day` between the working hours
pub fn free_slots(
    day: NaiveDate,
    busy: &[Interval],
    hours: WorkingHours,
    offset: FixedOffset,
) -> Result<FreeSlots> {
    let work = hours.span(day, offset)?;
    Ok(free_slots_within(work, busy))
}

/// Gaps inside `work` not covered by any of `busy`
pub fn free_slots_within(work: Interval, busy: &[Interval]) -> FreeSlots {
    let work = work.to_seconds();
    // zero-length blocks cover nothing and must not split a slot
    let mut busy: Vec<Interval> = busy
        .iter()
        .map(Interval::to_seconds)
        .filter(|b| !b.is_empty())
        .collect();
    busy.sort_by_key(Interval::start);

    let mut slots = Vec::new();
    let mut cursor: Instant = work.start();

    for block in &busy {
        let gap_end = block.start().min(work.end());
        if cursor < gap_end {
            slots.extend(Interval::new(cursor, gap_end).ok());
        }
        cursor = cursor.max(block.end());
    }

    if cursor < work.end() {
        slots.extend(Interval::new(cursor, work.end()).ok());
    }

    if slots.is_empty() {
        FreeSlots::FullyBooked
    } else {
        FreeSlots::Available(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn at(h: u32, m: u32) -> Instant {
        kst().with_ymd_and_hms(2024, 1, 15, h, m, 0).unwrap()
    }

    fn span(from: (u32, u32), to: (u32, u32)) -> Interval {
        Interval::new(at(from.0, from.1), at(to.0, to.1)).unwrap()
    }

    fn render(slots: &FreeSlots) -> Vec<String> {
        slots
            .slots()
            .iter()
            .map(|s| format!("{}-{}", s.start().format("%H:%M"), s.end().format("%H:%M")))
            .collect()
    }

    #[test]
    fn test_no_busy_time_gives_whole_day() {
        let slots = free_slots(day(), &[], WorkingHours::default(), kst()).unwrap();
        assert_eq!(slots, FreeSlots::Available(vec![span((9, 0), (19, 0))]));
    }

    #[test]
    fn test_gaps_between_meetings() {
        let busy = [span((9, 0), (10, 30)), span((13, 0), (14, 0))];
        let slots = free_slots(day(), &busy, WorkingHours::default(), kst()).unwrap();
        assert_eq!(render(&slots), vec!["10:30-13:00", "14:00-19:00"]);
    }

    #[test]
    fn test_unsorted_and_nested_busy_intervals() {
        let busy = [
            span((13, 0), (14, 0)),
            span((10, 0), (12, 0)),
            span((10, 30), (11, 0)),
            span((11, 30), (12, 30)),
        ];
        let slots = free_slots(day(), &busy, WorkingHours::default(), kst()).unwrap();
        assert_eq!(render(&slots), vec!["09:00-10:00", "12:30-13:00", "14:00-19:00"]);
    }

    #[test]
    fn test_busy_outside_working_hours_is_clipped() {
        let busy = [span((7, 0), (9, 30)), span((18, 0), (21, 0))];
        let slots = free_slots(day(), &busy, WorkingHours::default(), kst()).unwrap();
        assert_eq!(render(&slots), vec!["09:30-18:00"]);

        let late = [span((20, 0), (21, 0))];
        let slots = free_slots(day(), &late, WorkingHours::default(), kst()).unwrap();
        assert_eq!(render(&slots), vec!["09:00-19:00"]);
    }

    #[test]
    fn test_zero_length_busy_keeps_slot_whole() {
        let busy = [span((10, 0), (10, 0)), span((9, 0), (9, 0))];
        let slots = free_slots(day(), &busy, WorkingHours::default(), kst()).unwrap();
        assert_eq!(render(&slots), vec!["09:00-19:00"]);

        let busy = [span((12, 0), (12, 0)), span((13, 0), (14, 0))];
        let slots = free_slots(day(), &busy, WorkingHours::default(), kst()).unwrap();
        assert_eq!(render(&slots), vec!["09:00-13:00", "14:00-19:00"]);
    }

    #[test]
    fn test_fully_booked_is_explicit() {
        let busy = [span((8, 0), (12, 0)), span((11, 0), (19, 0))];
        let slots = free_slots(day(), &busy, WorkingHours::default(), kst()).unwrap();
        assert!(slots.is_fully_booked());
        assert!(slots.slots().is_empty());
    }

    #[test]
    fn test_free_and_busy_tile_the_day() {
        let busy = [
            span((9, 15), (9, 45)),
            span((11, 0), (12, 0)),
            span((12, 0), (12, 30)),
            span((16, 10), (18, 55)),
        ];
        let work = span((9, 0), (19, 0));
        let slots = free_slots(day(), &busy, WorkingHours::default(), kst()).unwrap();

        let mut pieces: Vec<Interval> = slots.slots().to_vec();
        pieces.extend_from_slice(&busy);
        pieces.sort_by_key(Interval::start);

        assert_eq!(pieces.first().unwrap().start(), work.start());
        assert_eq!(pieces.last().unwrap().end(), work.end());
        for pair in pieces.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start(), "gap or overlap at {:?}", pair);
        }
    }

    #[test]
    fn test_sub_second_precision_is_ignored() {
        let busy = [Interval::new(at(9, 0), at(19, 0) - Duration::milliseconds(400)).unwrap()];
        let slots = free_slots(day(), &busy, WorkingHours::default(), kst()).unwrap();
        assert_eq!(render(&slots), vec!["18:59-19:00"]);
    }

    #[test]
    fn test_invalid_working_hours() {
        assert!(WorkingHours::new(19, 9).is_err());
        assert!(WorkingHours::new(9, 25).is_err());
        assert!(WorkingHours::new(0, 24).is_ok());
        let bad = WorkingHours {
            start_hour: 10,
            end_hour: 10,
        };
        assert!(free_slots(day(), &[], bad, kst()).is_err());
    }
}
