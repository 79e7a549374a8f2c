//! Locale token table
//!
//! Maps user-facing words (day terms, AM/PM markers, command keywords) onto
//! the symbols the resolver and the interpreter work with. The built-in table
//! carries English and Korean; configuration can append more words.

use serde::{Deserialize, Serialize};

use crate::types::RelativeDay;

/// A single word standing for a relative day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayToken {
    pub word: String,
    pub day: RelativeDay,
}

/// Command keywords, one list per intent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandWords {
    #[serde(default)]
    pub list: Vec<String>,
    /// List shortcuts whose date is optional ("일정 보여줘")
    #[serde(default)]
    pub show: Vec<String>,
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub delete: Vec<String>,
    #[serde(default)]
    pub free_time: Vec<String>,
    #[serde(default)]
    pub health: Vec<String>,
}

/// Extra words from the `[locale]` config section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    #[serde(default)]
    pub today: Vec<String>,
    #[serde(default)]
    pub tomorrow: Vec<String>,
    #[serde(default)]
    pub day_after_tomorrow: Vec<String>,
    #[serde(default)]
    pub this_week: Vec<String>,
    #[serde(default)]
    pub next_week: Vec<String>,
    #[serde(default)]
    pub afternoon: Vec<String>,
    #[serde(default)]
    pub morning: Vec<String>,
    #[serde(default)]
    pub commands: CommandWords,
}

/// Token table consulted by the resolver and the command rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleTable {
    days: Vec<DayToken>,
    afternoon: Vec<String>,
    morning: Vec<String>,
    commands: CommandWords,
}

impl Default for LocaleTable {
    fn default() -> Self {
        let day = |word: &str, day| DayToken {
            word: word.to_string(),
            day,
        };
        let words = |list: &[&str]| list.iter().map(|w| w.to_string()).collect::<Vec<_>>();

        Self {
            days: vec![
                day("today", RelativeDay::Today),
                day("오늘", RelativeDay::Today),
                day("tomorrow", RelativeDay::Tomorrow),
                day("내일", RelativeDay::Tomorrow),
                day("day-after-tomorrow", RelativeDay::DayAfterTomorrow),
                day("day_after_tomorrow", RelativeDay::DayAfterTomorrow),
                day("day after tomorrow", RelativeDay::DayAfterTomorrow),
                day("모레", RelativeDay::DayAfterTomorrow),
                day("this-week", RelativeDay::ThisWeek),
                day("this_week", RelativeDay::ThisWeek),
                day("this week", RelativeDay::ThisWeek),
                day("이번주", RelativeDay::ThisWeek),
                day("이번 주", RelativeDay::ThisWeek),
                day("next-week", RelativeDay::NextWeek),
                day("next_week", RelativeDay::NextWeek),
                day("next week", RelativeDay::NextWeek),
                day("다음주", RelativeDay::NextWeek),
                day("다음 주", RelativeDay::NextWeek),
            ],
            afternoon: words(&["afternoon", "pm", "오후"]),
            morning: words(&["morning", "am", "오전"]),
            commands: CommandWords {
                list: words(&["캘린더 조회", "일정 조회", "list"]),
                show: words(&["일정 보여줘", "show"]),
                add: words(&["캘린더 추가", "일정 추가", "add"]),
                delete: words(&["캘린더 삭제", "일정 삭제", "delete"]),
                free_time: words(&["캘린더 빈시간", "빈시간", "free"]),
                health: words(&["health_check", "health", "서버 테스트", "캘린더 상태"]),
            },
        }
    }
}

impl LocaleTable {
    /// Built-in table extended with configured words
    pub fn with_config(config: &LocaleConfig) -> Self {
        let mut table = Self::default();
        table.extend(config);
        table
    }

    /// Append the words from `config`
    pub fn extend(&mut self, config: &LocaleConfig) {
        let groups = [
            (&config.today, RelativeDay::Today),
            (&config.tomorrow, RelativeDay::Tomorrow),
            (&config.day_after_tomorrow, RelativeDay::DayAfterTomorrow),
            (&config.this_week, RelativeDay::ThisWeek),
            (&config.next_week, RelativeDay::NextWeek),
        ];
        for (words, day) in groups {
            for word in words {
                self.days.push(DayToken {
                    word: normalize(word),
                    day,
                });
            }
        }

        self.afternoon.extend(config.afternoon.iter().map(|w| normalize(w)));
        self.morning.extend(config.morning.iter().map(|w| normalize(w)));

        let commands = &config.commands;
        self.commands.list.extend(commands.list.iter().cloned());
        self.commands.show.extend(commands.show.iter().cloned());
        self.commands.add.extend(commands.add.iter().cloned());
        self.commands.delete.extend(commands.delete.iter().cloned());
        self.commands.free_time.extend(commands.free_time.iter().cloned());
        self.commands.health.extend(commands.health.iter().cloned());
    }

    /// Relative day whose word equals the whole (normalized) text
    pub fn day_exact(&self, text: &str) -> Option<RelativeDay> {
        let text = normalize(text);
        self.days.iter().find(|t| t.word == text).map(|t| t.day)
    }

    /// Relative day whose word appears inside the text
    ///
    /// The longest matching word wins, so "day-after-tomorrow" is not read as
    /// "tomorrow".
    pub fn day_within(&self, text: &str) -> Option<RelativeDay> {
        let text = normalize(text);
        self.days
            .iter()
            .filter(|t| contains_word(&text, &t.word))
            .max_by_key(|t| t.word.len())
            .map(|t| t.day)
    }

    pub fn has_afternoon_marker(&self, text: &str) -> bool {
        let text = normalize(text);
        self.afternoon.iter().any(|w| contains_word(&text, w))
    }

    pub fn has_morning_marker(&self, text: &str) -> bool {
        let text = normalize(text);
        self.morning.iter().any(|w| contains_word(&text, w))
    }

    pub fn commands(&self) -> &CommandWords {
        &self.commands
    }
}

/// Lowercase and collapse runs of whitespace
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Substring match that refuses to split a Latin word ("am" in "team")
fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    haystack.match_indices(word).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + word.len()..].chars().next();
        let is_letter = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphabetic());
        !is_letter(before) && !is_letter(after)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_exact_is_case_insensitive() {
        let table = LocaleTable::default();
        assert_eq!(table.day_exact("Tomorrow"), Some(RelativeDay::Tomorrow));
        assert_eq!(table.day_exact("  내일 "), Some(RelativeDay::Tomorrow));
        assert_eq!(table.day_exact("NEXT   week"), Some(RelativeDay::NextWeek));
        assert_eq!(table.day_exact("tomorrow 3"), None);
    }

    #[test]
    fn test_day_within_prefers_longest_word() {
        let table = LocaleTable::default();
        assert_eq!(
            table.day_within("day-after-tomorrow 3"),
            Some(RelativeDay::DayAfterTomorrow)
        );
        assert_eq!(table.day_within("내일 오후 3시"), Some(RelativeDay::Tomorrow));
        assert_eq!(table.day_within("모레3시"), Some(RelativeDay::DayAfterTomorrow));
        assert_eq!(table.day_within("someday"), None);
    }

    #[test]
    fn test_markers_respect_word_boundaries() {
        let table = LocaleTable::default();
        assert!(table.has_afternoon_marker("3pm"));
        assert!(table.has_afternoon_marker("오후3시"));
        assert!(!table.has_morning_marker("team sync"));
        assert!(table.has_morning_marker("tomorrow 9 AM"));
    }

    #[test]
    fn test_extend_from_config() {
        let config = LocaleConfig {
            tomorrow: vec!["Morgen".to_string()],
            afternoon: vec!["nachmittags".to_string()],
            commands: CommandWords {
                add: vec!["neu".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let table = LocaleTable::with_config(&config);
        assert_eq!(table.day_exact("morgen"), Some(RelativeDay::Tomorrow));
        assert!(table.has_afternoon_marker("morgen 3 nachmittags"));
        assert!(table.commands().add.contains(&"neu".to_string()));
        // built-in words survive
        assert_eq!(table.day_exact("오늘"), Some(RelativeDay::Today));
    }
}
