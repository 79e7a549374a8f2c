//! Reply text for chat users

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::types::Outcome;
use crate::error::Error;
use crate::schedule::{FreeSlots, WorkingHours};
use crate::types::Event;

const DEFAULTED_DATE_NOTE: &str = "ℹ️ 날짜를 이해하지 못해 오늘 날짜를 사용했습니다.";
const DEFAULTED_TIME_NOTE: &str = "ℹ️ 날짜/시간을 이해하지 못해 기본 시간(1시간 후)을 사용했습니다.";

/// Render a successful outcome
pub fn outcome(outcome: &Outcome, hours: WorkingHours, preview_length: usize) -> String {
    match outcome {
        Outcome::Events {
            date,
            days,
            date_defaulted,
            events,
        } => {
            let body = if *days > 1 {
                span_list(*date, *days, events, preview_length)
            } else {
                event_list(*date, events, preview_length)
            };
            with_note(body, *date_defaulted, DEFAULTED_DATE_NOTE)
        }
        Outcome::Added {
            event,
            conflicts,
            time_defaulted,
        } => with_note(added(event, conflicts), *time_defaulted, DEFAULTED_TIME_NOTE),
        Outcome::Deleted { event_id } => format!("✅ 일정이 삭제되었습니다. (ID: {})", event_id),
        Outcome::FreeTime {
            date,
            date_defaulted,
            slots,
        } => with_note(free_time(*date, slots, hours), *date_defaulted, DEFAULTED_DATE_NOTE),
        Outcome::Health { calendar_name } => {
            format!("✅ 서버 정상 작동 중\n📅 연결된 캘린더: {}", calendar_name)
        }
        Outcome::Unknown => format!("❌ 알 수 없는 명령어입니다.\n\n{}", help()),
    }
}

/// Render a failure; usage errors carry their own text
pub fn error(err: &Error) -> String {
    match err {
        Error::Usage(usage) => usage.clone(),
        Error::NotFound(id) => format!("❌ 삭제할 일정을 찾을 수 없습니다. (ID: {})", id),
        Error::Provider(detail) => format!("❌ 캘린더 오류: {}", detail),
        Error::Parse(text) => format!("❌ 날짜/시간을 이해하지 못했습니다: {}", text),
        other => format!("❌ 처리 중 오류가 발생했습니다: {}", other),
    }
}

/// Command overview shown for unknown input
pub fn help() -> String {
    [
        "📋 사용 가능한 명령어:",
        "• 캘린더 조회 2024-01-15",
        "• 캘린더 조회 이번주",
        "• 일정 보여줘",
        "• 캘린더 추가 2024-01-15 14:00 회의 제목",
        "• 캘린더 삭제 <event_id>",
        "• 빈시간 내일",
        "• health_check",
    ]
    .join("\n")
}

fn with_note(body: String, flagged: bool, note: &str) -> String {
    if flagged {
        format!("{}\n\n{}", body, note)
    } else {
        body
    }
}

fn event_list(date: NaiveDate, events: &[Event], preview_length: usize) -> String {
    if events.is_empty() {
        return format!("📅 {}에는 일정이 없습니다.", date);
    }

    let mut out = format!("📅 {} 일정:\n", date);
    for (i, event) in events.iter().enumerate() {
        push_entry(&mut out, i + 1, event, preview_length);
    }
    out.trim_end().to_string()
}

/// Several days, grouped under a heading per day that has events
fn span_list(from: NaiveDate, days: u32, events: &[Event], preview_length: usize) -> String {
    let until = from + Duration::days(i64::from(days) - 1);
    if events.is_empty() {
        return format!("📅 {} ~ {}에는 일정이 없습니다.", from, until);
    }

    let mut out = format!("📅 {} ~ {} 일정:\n", from, until);
    for day in from.iter_days().take(days as usize) {
        // events already running at the start are listed under the first day
        let on_day: Vec<&Event> = events
            .iter()
            .filter(|e| e.start().date_naive().max(from) == day)
            .collect();
        if on_day.is_empty() {
            continue;
        }
        out.push_str(&format!("\n🗓️ {} ({})\n", day, weekday_name(day.weekday())));
        for (i, event) in on_day.into_iter().enumerate() {
            push_entry(&mut out, i + 1, event, preview_length);
        }
    }
    out.trim_end().to_string()
}

fn push_entry(out: &mut String, number: usize, event: &Event, preview_length: usize) {
    let when = if event.all_day {
        "종일".to_string()
    } else {
        event.start().format("%H:%M").to_string()
    };
    out.push_str(&format!("\n{}. {} ({})\n", number, event.title, when));
    if let Some(location) = &event.location {
        out.push_str(&format!("   📍 {}\n", location));
    }
    if let Some(description) = &event.description {
        out.push_str(&format!("   📝 {}\n", preview(description, preview_length)));
    }
    if let Some(id) = &event.id {
        out.push_str(&format!("   🔗 ID: {}\n", id));
    }
}

fn added(event: &Event, conflicts: &[Event]) -> String {
    let mut out = format!(
        "✅ 일정이 추가되었습니다!\n\n📌 제목: {}\n🕐 시간: {}",
        event.title,
        event.start().format("%Y-%m-%d %H:%M")
    );
    if let Some(id) = &event.id {
        out.push_str(&format!("\n🔗 ID: {}", id));
    }
    if !conflicts.is_empty() {
        let titles: Vec<&str> = conflicts.iter().map(|e| e.title.as_str()).collect();
        out.push_str(&format!(
            "\n\n⚠️ {}개의 기존 일정과 시간이 겹칩니다: {}",
            conflicts.len(),
            titles.join(", ")
        ));
    }
    out
}

fn free_time(date: NaiveDate, slots: &FreeSlots, hours: WorkingHours) -> String {
    let header = format!("🕐 {} ({}) 빈 시간:", date, weekday_name(date.weekday()));
    match slots {
        FreeSlots::FullyBooked => format!(
            "{}\n\n⛔ {:02}:00 - {:02}:00 시간대가 모두 사용 중입니다.",
            header, hours.start_hour, hours.end_hour
        ),
        FreeSlots::Available(slots) => {
            let lines: Vec<String> = slots.iter().map(|s| format!("⭕ {}", s.format_hm())).collect();
            format!("{}\n\n{}", header, lines.join("\n"))
        }
    }
}

/// First `limit` characters, with an ellipsis only when something was cut
fn preview(text: &str, limit: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "월요일",
        Weekday::Tue => "화요일",
        Weekday::Wed => "수요일",
        Weekday::Thu => "목요일",
        Weekday::Fri => "금요일",
        Weekday::Sat => "토요일",
        Weekday::Sun => "일요일",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Interval;
    use chrono::{FixedOffset, TimeZone};

    fn at(h: u32, m: u32) -> crate::types::Instant {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, h, m, 0)
            .unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_preview_only_marks_truncation() {
        assert_eq!(preview("short", 50), "short");
        let exact = "a".repeat(50);
        assert_eq!(preview(&exact, 50), exact);
        let long = "가".repeat(51);
        assert_eq!(preview(&long, 50), format!("{}...", "가".repeat(50)));
    }

    #[test]
    fn test_empty_event_list() {
        let text = outcome(
            &Outcome::Events {
                date: day(),
                days: 1,
                date_defaulted: false,
                events: vec![],
            },
            WorkingHours::default(),
            50,
        );
        assert_eq!(text, "📅 2024-01-15에는 일정이 없습니다.");
    }

    #[test]
    fn test_event_list_entries() {
        let event = Event::new("Standup", Interval::new(at(9, 30), at(10, 0)).unwrap())
            .with_id("ev1")
            .with_location("Room 3")
            .with_description("daily");
        let text = outcome(
            &Outcome::Events {
                date: day(),
                days: 1,
                date_defaulted: true,
                events: vec![event],
            },
            WorkingHours::default(),
            50,
        );
        assert!(text.starts_with("📅 2024-01-15 일정:"));
        assert!(text.contains("1. Standup (09:30)"));
        assert!(text.contains("📍 Room 3"));
        assert!(text.contains("📝 daily"));
        assert!(text.contains("🔗 ID: ev1"));
        assert!(text.ends_with(DEFAULTED_DATE_NOTE));
    }

    #[test]
    fn test_span_list_groups_by_day() {
        let tuesday = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 16, 11, 0, 0)
            .unwrap();
        let events = vec![
            Event::new("Standup", Interval::new(at(9, 30), at(10, 0)).unwrap()),
            Event::new("Review", Interval::starting_at(tuesday, Duration::hours(1)).unwrap()),
        ];
        let text = outcome(
            &Outcome::Events {
                date: day(),
                days: 7,
                date_defaulted: false,
                events,
            },
            WorkingHours::default(),
            50,
        );
        assert_eq!(
            text,
            "📅 2024-01-15 ~ 2024-01-21 일정:\n\n🗓️ 2024-01-15 (월요일)\n\n1. Standup (09:30)\n\n🗓️ 2024-01-16 (화요일)\n\n1. Review (11:00)"
        );

        let empty = outcome(
            &Outcome::Events {
                date: day(),
                days: 7,
                date_defaulted: false,
                events: vec![],
            },
            WorkingHours::default(),
            50,
        );
        assert_eq!(empty, "📅 2024-01-15 ~ 2024-01-21에는 일정이 없습니다.");
    }

    #[test]
    fn test_added_with_conflict_annex() {
        let event = Event::new("Team Sync", Interval::new(at(14, 0), at(15, 0)).unwrap()).with_id("new");
        let existing = Event::new("Review", Interval::new(at(14, 30), at(15, 30)).unwrap());
        let text = outcome(
            &Outcome::Added {
                event,
                conflicts: vec![existing],
                time_defaulted: false,
            },
            WorkingHours::default(),
            50,
        );
        assert!(text.contains("📌 제목: Team Sync"));
        assert!(text.contains("🕐 시간: 2024-01-15 14:00"));
        assert!(text.contains("⚠️ 1개의 기존 일정과 시간이 겹칩니다: Review"));
        assert!(!text.contains("ℹ️"));
    }

    #[test]
    fn test_free_time_rendering() {
        let slots = FreeSlots::Available(vec![Interval::new(at(10, 30), at(13, 0)).unwrap()]);
        let text = outcome(
            &Outcome::FreeTime {
                date: day(),
                date_defaulted: false,
                slots,
            },
            WorkingHours::default(),
            50,
        );
        assert_eq!(text, "🕐 2024-01-15 (월요일) 빈 시간:\n\n⭕ 10:30 - 13:00");

        let text = outcome(
            &Outcome::FreeTime {
                date: day(),
                date_defaulted: false,
                slots: FreeSlots::FullyBooked,
            },
            WorkingHours::default(),
            50,
        );
        assert!(text.contains("⛔ 09:00 - 19:00 시간대가 모두 사용 중입니다."));
    }

    #[test]
    fn test_errors_are_distinct() {
        let not_found = error(&Error::NotFound("x1".to_string()));
        let provider = error(&Error::Provider("timeout".to_string()));
        assert!(not_found.contains("찾을 수 없습니다"));
        assert!(provider.contains("timeout"));
        assert_ne!(not_found, provider);
        assert_eq!(error(&Error::Usage("❌ 사용법: x".to_string())), "❌ 사용법: x");
    }
}
