//! Data models for the CalDAV adapter

use std::time::Duration;

use cb_core::CalendarSettings;
use chrono::{FixedOffset, Offset, Utc};

use crate::error::{CalendarError, Result};

/// Connection settings for a CalDAV server
#[derive(Debug, Clone)]
pub struct CalDavConfig {
    /// Collection root; calendar ids are appended as path segments
    pub server_url: String,
    pub username: String,
    pub password: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Zone for floating and `TZID` times
    pub utc_offset: FixedOffset,
}

impl CalDavConfig {
    pub fn new(server_url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(15),
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Build from the `[calendar]` config section
    pub fn from_settings(settings: &CalendarSettings) -> Result<Self> {
        let server_url = settings
            .server_url
            .clone()
            .ok_or_else(|| CalendarError::Configuration("CALDAV_URL not set".to_string()))?;
        let offset = settings.offset()?;

        Ok(Self::new(
            server_url,
            settings.username.clone().unwrap_or_default(),
            settings.password.clone().unwrap_or_default(),
        )
        .with_timeout(Duration::from_secs(settings.timeout_secs))
        .with_utc_offset(offset))
    }
}

/// One event resource from a `calendar-query` report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventResource {
    /// Resource name without the `.ics` suffix
    pub name: Option<String>,
    pub ical: String,
}
