//! Overlap detection for new events
//!
//! Conflicts are advisory. The caller reports them and creates the event
//! anyway.

use crate::types::{Event, Interval};

/// Every existing event overlapping `candidate`
///
/// Uses the half-open test `existing.start < candidate.end &&
/// candidate.start < existing.end`, so an event ending exactly when the
/// candidate starts is not a conflict.
pub fn conflicts(candidate: &Interval, existing: &[Event]) -> Vec<Event> {
    existing
        .iter()
        .filter(|event| event.interval.overlaps(candidate))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Instant;
    use chrono::{FixedOffset, TimeZone};

    fn at(h: u32, m: u32) -> Instant {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, h, m, 0)
            .unwrap()
    }

    fn event(title: &str, from: (u32, u32), to: (u32, u32)) -> Event {
        Event::new(title, Interval::new(at(from.0, from.1), at(to.0, to.1)).unwrap())
    }

    #[test]
    fn test_touching_events_do_not_conflict() {
        let candidate = Interval::new(at(14, 0), at(15, 0)).unwrap();
        let existing = [event("before", (13, 0), (14, 0)), event("after", (15, 0), (16, 0))];
        assert!(conflicts(&candidate, &existing).is_empty());
    }

    #[test]
    fn test_overlapping_events_are_reported() {
        let candidate = Interval::new(at(14, 0), at(15, 0)).unwrap();
        let existing = [
            event("tail", (13, 30), (14, 1)),
            event("inside", (14, 15), (14, 45)),
            event("around", (8, 0), (20, 0)),
            event("elsewhere", (16, 0), (17, 0)),
        ];
        let found: Vec<String> = conflicts(&candidate, &existing)
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(found, vec!["tail", "inside", "around"]);
    }

    #[test]
    fn test_zero_length_candidate_inside_event() {
        let candidate = Interval::new(at(14, 0), at(14, 0)).unwrap();
        let existing = [event("meeting", (13, 0), (15, 0)), event("later", (14, 0), (15, 0))];
        let found = conflicts(&candidate, &existing);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "meeting");
    }
}
