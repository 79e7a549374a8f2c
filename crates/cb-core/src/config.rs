//! Configuration management
//!
//! Settings are read in this order of precedence:
//! 1. environment variables
//! 2. the `cb-gateway.toml` config file
//! 3. built-in defaults
//!
//! `${VAR_NAME}` inside the config file is replaced with the variable's value.

use std::path::Path;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::interpreter::InterpreterSettings;
use crate::resolver::{LocaleConfig, LocaleTable};
use crate::schedule::WorkingHours;
use crate::Error;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "cb-gateway.toml";

/// Longest event `add` may create, in minutes
pub const MAX_EVENT_MINUTES: i64 = 24 * 60;

/// Which [`crate::IntervalStore`] backs the interpreter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// CalDAV server
    CalDav,
    /// Process-local store, nothing persisted
    #[default]
    Memory,
}

impl ProviderKind {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "caldav" | "dav" => Self::CalDav,
            _ => Self::Memory,
        }
    }
}

/// Calendar provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSettings {
    #[serde(default)]
    pub provider: ProviderKind,

    /// CalDAV collection URL
    pub server_url: Option<String>,

    pub username: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<String>,

    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// Offset every instant is interpreted in, e.g. `+09:00`
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            server_url: None,
            username: None,
            password: None,
            calendar_id: default_calendar_id(),
            utc_offset: default_utc_offset(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CalendarSettings {
    /// Parse [`utc_offset`](Self::utc_offset) (`+09:00`, `-0530`, `Z`)
    pub fn offset(&self) -> crate::Result<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
    }
}

/// Working day and reply formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_work_start_hour")]
    pub work_start_hour: u32,

    #[serde(default = "default_work_end_hour")]
    pub work_end_hour: u32,

    /// Length of events created through `add`
    #[serde(default = "default_event_minutes")]
    pub default_event_minutes: i64,

    /// Description characters shown in listings
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            work_start_hour: default_work_start_hour(),
            work_end_hour: default_work_end_hour(),
            default_event_minutes: default_event_minutes(),
            preview_length: default_preview_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bearer key for `/api/*`; unset leaves the API open
    pub key: Option<String>,

    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins. Localhost only when unset.
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            port: default_api_port(),
            allowed_origins: None,
        }
    }
}

/// Main configuration for cb-gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarSettings,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub locale: LocaleConfig,
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_utc_offset() -> String {
    "+09:00".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_work_start_hour() -> u32 {
    9
}

fn default_work_end_hour() -> u32 {
    19
}

fn default_event_minutes() -> i64 {
    60
}

fn default_preview_length() -> usize {
    50
}

fn default_api_port() -> u16 {
    9000
}

impl Config {
    /// Replace `${VAR_NAME}` with the variable's value; unknown variables
    /// become empty strings
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load a TOML config file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides();
        cfg.validate()?;

        Ok(cfg)
    }

    /// Parse TOML text after `${VAR}` expansion, without environment overrides
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded = Self::expand_env_vars(content);
        let toml: TomlConfig =
            toml::from_str(&expanded).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        Ok(Self::from_toml_config(toml))
    }

    /// Load `./cb-gateway.toml` when present, otherwise the environment only
    pub fn load() -> crate::Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }

        Self::from_env()
    }

    fn from_toml_config(toml: TomlConfig) -> Self {
        let calendar = toml.calendar.unwrap_or_default();
        let calendar = CalendarSettings {
            provider: calendar
                .provider
                .as_deref()
                .map(ProviderKind::parse)
                .unwrap_or_default(),
            server_url: calendar.server_url.filter(|s| !s.is_empty()),
            username: calendar.username.filter(|s| !s.is_empty()),
            password: calendar.password.filter(|s| !s.is_empty()),
            calendar_id: calendar.calendar_id.unwrap_or_else(default_calendar_id),
            utc_offset: calendar.utc_offset.unwrap_or_else(default_utc_offset),
            timeout_secs: calendar.timeout_secs.unwrap_or_else(default_timeout_secs),
        };

        let schedule = toml.schedule.unwrap_or_default();
        let schedule = ScheduleConfig {
            work_start_hour: schedule.work_start_hour.unwrap_or_else(default_work_start_hour),
            work_end_hour: schedule.work_end_hour.unwrap_or_else(default_work_end_hour),
            default_event_minutes: schedule.default_event_minutes.unwrap_or_else(default_event_minutes),
            preview_length: schedule.preview_length.unwrap_or_else(default_preview_length),
        };

        let api = toml.api.unwrap_or_default();
        let api = ApiConfig {
            key: api.key.filter(|k| !k.is_empty()),
            port: api.port.unwrap_or_else(default_api_port),
            allowed_origins: api.allowed_origins,
        };

        Config {
            calendar,
            schedule,
            api,
            locale: toml.locale.unwrap_or_default(),
        }
    }

    /// Environment variables win over file values
    fn apply_env_overrides(&mut self) {
        if let Ok(provider) = std::env::var("CALENDAR_PROVIDER") {
            if !provider.is_empty() {
                self.calendar.provider = ProviderKind::parse(&provider);
            }
        }
        if let Ok(url) = std::env::var("CALDAV_URL") {
            if !url.is_empty() {
                self.calendar.server_url = Some(url);
            }
        }
        if let Ok(username) = std::env::var("CALDAV_USERNAME") {
            self.calendar.username = Some(username);
        }
        if let Ok(password) = std::env::var("CALDAV_PASSWORD") {
            self.calendar.password = Some(password);
        }
        if let Ok(id) = std::env::var("CALENDAR_ID") {
            if !id.is_empty() {
                self.calendar.calendar_id = id;
            }
        }
        if let Ok(offset) = std::env::var("CALENDAR_UTC_OFFSET") {
            if !offset.is_empty() {
                self.calendar.utc_offset = offset;
            }
        }
        if let Some(secs) = env_parse("CALDAV_TIMEOUT_SECS") {
            self.calendar.timeout_secs = secs;
        }

        if let Some(hour) = env_parse("WORK_START_HOUR") {
            self.schedule.work_start_hour = hour;
        }
        if let Some(hour) = env_parse("WORK_END_HOUR") {
            self.schedule.work_end_hour = hour;
        }
        if let Some(minutes) = env_parse("DEFAULT_EVENT_MINUTES") {
            self.schedule.default_event_minutes = minutes;
        }
        if let Some(len) = env_parse("PREVIEW_LENGTH") {
            self.schedule.preview_length = len;
        }

        if let Ok(key) = std::env::var("API_KEY") {
            self.api.key = Some(key).filter(|k| !k.is_empty());
        }
        // PORT is what most hosting platforms set
        if let Some(port) = env_parse("PORT").or_else(|| env_parse("API_PORT")) {
            self.api.port = port;
        }
        if let Ok(origins) = std::env::var("API_ALLOWED_ORIGINS") {
            self.api.allowed_origins = Some(split_list(&origins));
        }
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings that would fail later at request time
    pub fn validate(&self) -> crate::Result<()> {
        self.working_hours()?;
        self.calendar.offset()?;
        if !(1..=MAX_EVENT_MINUTES).contains(&self.schedule.default_event_minutes) {
            return Err(Error::Config(format!(
                "default_event_minutes must be between 1 and {}, got {}",
                MAX_EVENT_MINUTES, self.schedule.default_event_minutes
            )));
        }
        if self.calendar.provider == ProviderKind::CalDav && self.calendar.server_url.is_none() {
            return Err(Error::Config("CalDAV provider selected but CALDAV_URL not set".to_string()));
        }
        Ok(())
    }

    pub fn working_hours(&self) -> crate::Result<WorkingHours> {
        WorkingHours::new(self.schedule.work_start_hour, self.schedule.work_end_hour)
    }

    /// Built-in locale words plus the `[locale]` additions
    pub fn locale_table(&self) -> LocaleTable {
        LocaleTable::with_config(&self.locale)
    }

    pub fn interpreter_settings(&self) -> crate::Result<InterpreterSettings> {
        Ok(InterpreterSettings {
            calendar_id: self.calendar.calendar_id.clone(),
            working_hours: self.working_hours()?,
            event_minutes: self.schedule.default_event_minutes,
            preview_length: self.schedule.preview_length,
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `+HH:MM`, `-HHMM`, `+HH` or `Z`
pub fn parse_utc_offset(value: &str) -> crate::Result<FixedOffset> {
    let invalid = || Error::Config(format!("invalid UTC offset: {:?}", value));
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, digits) = match value.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid()),
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.as_str(), "0"),
        4 => digits.split_at(2),
        _ => return Err(invalid()),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

// TOML file layout; every field optional so partial files work

#[derive(Debug, Deserialize)]
struct TomlConfig {
    calendar: Option<TomlCalendarConfig>,
    schedule: Option<TomlScheduleConfig>,
    api: Option<TomlApiConfig>,
    locale: Option<LocaleConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlCalendarConfig {
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    server_url: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    calendar_id: Option<String>,
    #[serde(default)]
    utc_offset: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlScheduleConfig {
    #[serde(default)]
    work_start_hour: Option<u32>,
    #[serde(default)]
    work_end_hour: Option<u32>,
    #[serde(default)]
    default_event_minutes: Option<i64>,
    #[serde(default)]
    preview_length: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlApiConfig {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    allowed_origins: Option<Vec<String>>,
}
