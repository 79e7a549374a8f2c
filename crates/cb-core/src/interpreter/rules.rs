//! Command classification rules
//!
//! A command is matched against an ordered table of rules; the first rule
//! whose keyword prefixes the command decides the intent. A rule that
//! matches but cannot extract its arguments produces its usage text instead.

use std::sync::OnceLock;

use regex::Regex;

use super::types::{Command, CommandArgs, Intent};
use crate::error::{Error, Result};
use crate::resolver::LocaleTable;

pub const LIST_USAGE: &str = "❌ 사용법: 캘린더 조회 2024-01-15";
pub const SHOW_USAGE: &str = "❌ 사용법: 일정 보여줘 [날짜]";
pub const ADD_USAGE: &str = "❌ 사용법: 캘린더 추가 2024-01-15 14:00 회의 제목";
pub const DELETE_USAGE: &str = "❌ 사용법: 캘린더 삭제 <event_id>";
pub const FREE_TIME_USAGE: &str = "❌ 사용법: 빈시간 2024-01-15";
pub const HEALTH_USAGE: &str = "❌ 사용법: health_check";

/// Pulls arguments out of the text following a keyword
type Extractor = fn(&str) -> Option<CommandArgs>;

/// How a keyword has to appear in the command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Keyword followed by whitespace or end of input
    Prefix,
    /// Whole command equals the keyword
    Exact,
}

/// One row of the dispatch table
#[derive(Debug, Clone)]
pub struct Rule {
    pub intent: Intent,
    pub keywords: Vec<String>,
    pub kind: MatchKind,
    pub usage: &'static str,
    extract: Extractor,
}

impl Rule {
    fn new(intent: Intent, keywords: &[String], kind: MatchKind, usage: &'static str, extract: Extractor) -> Self {
        let mut keywords = keywords.to_vec();
        // "캘린더 빈시간" must be tried before "빈시간"
        keywords.sort_by_key(|k| std::cmp::Reverse(k.len()));
        Self {
            intent,
            keywords,
            kind,
            usage,
            extract,
        }
    }

    /// Text after the matching keyword, or `None` when no keyword matches
    pub fn remainder<'a>(&self, raw: &'a str) -> Option<&'a str> {
        self.keywords.iter().find_map(|keyword| {
            let rest = strip_keyword(raw, keyword)?;
            match self.kind {
                MatchKind::Exact => rest.trim().is_empty().then_some(""),
                MatchKind::Prefix => Some(rest),
            }
        })
    }

    /// `None` when the rule does not apply; otherwise the extracted
    /// arguments or the rule's usage error
    pub fn apply(&self, raw: &str) -> Option<Result<CommandArgs>> {
        let rest = self.remainder(raw)?;
        Some((self.extract)(rest.trim()).ok_or_else(|| Error::Usage(self.usage.to_string())))
    }
}

/// Ordered dispatch table
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Standard rule order: list, list shortcut, add, delete, free time, health
    pub fn from_locale(locale: &LocaleTable) -> Self {
        let words = locale.commands();
        Self {
            rules: vec![
                Rule::new(Intent::ListEvents, &words.list, MatchKind::Prefix, LIST_USAGE, required_date),
                Rule::new(Intent::ListEvents, &words.show, MatchKind::Prefix, SHOW_USAGE, optional_date),
                Rule::new(Intent::AddEvent, &words.add, MatchKind::Prefix, ADD_USAGE, date_time_title),
                Rule::new(Intent::DeleteEvent, &words.delete, MatchKind::Prefix, DELETE_USAGE, event_id),
                Rule::new(Intent::QueryFreeTime, &words.free_time, MatchKind::Prefix, FREE_TIME_USAGE, optional_date),
                Rule::new(Intent::HealthCheck, &words.health, MatchKind::Exact, HEALTH_USAGE, no_args),
            ],
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Usage text of the first rule for `intent`
    pub fn usage(&self, intent: Intent) -> Option<&'static str> {
        self.rules.iter().find(|r| r.intent == intent).map(|r| r.usage)
    }

    /// Classify a raw command; unmatched commands become [`Intent::Unknown`]
    pub fn classify(&self, raw: &str) -> Result<Command> {
        let trimmed = raw.trim();
        for rule in &self.rules {
            if let Some(args) = rule.apply(trimmed) {
                return Ok(Command {
                    raw: raw.to_string(),
                    intent: rule.intent,
                    args: args?,
                });
            }
        }
        Ok(Command {
            raw: raw.to_string(),
            intent: Intent::Unknown,
            args: CommandArgs::default(),
        })
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::from_locale(&LocaleTable::default())
    }
}

/// Strip a keyword off the front of `raw`
///
/// Words of the keyword may be separated by any run of whitespace, and the
/// keyword must end at whitespace or end of input.
fn strip_keyword<'a>(raw: &'a str, keyword: &str) -> Option<&'a str> {
    let mut rest = raw;
    let mut words = keyword.split_whitespace().peekable();
    words.peek()?;
    while let Some(word) = words.next() {
        let head = rest.get(..word.len())?;
        if !head.eq_ignore_ascii_case(word) {
            return None;
        }
        rest = &rest[word.len()..];
        if words.peek().is_some() {
            let trimmed = rest.trim_start();
            if trimmed.len() == rest.len() {
                return None;
            }
            rest = trimmed;
        }
    }
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

fn required_date(rest: &str) -> Option<CommandArgs> {
    (!rest.is_empty()).then(|| CommandArgs::default().with_date(rest))
}

fn optional_date(rest: &str) -> Option<CommandArgs> {
    Some(CommandArgs {
        date: (!rest.is_empty()).then(|| rest.to_string()),
        ..Default::default()
    })
}

fn date_time_title(rest: &str) -> Option<CommandArgs> {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    let shape = SHAPE.get_or_init(|| Regex::new(r"^(\S+)\s+(\S+)\s+(.+)$").unwrap());
    let caps = shape.captures(rest)?;
    Some(
        CommandArgs::default()
            .with_date(&caps[1])
            .with_time(&caps[2])
            .with_title(caps[3].trim()),
    )
}

fn event_id(rest: &str) -> Option<CommandArgs> {
    (!rest.is_empty()).then(|| CommandArgs::default().with_event_id(rest))
}

fn no_args(_rest: &str) -> Option<CommandArgs> {
    Some(CommandArgs::default())
}
