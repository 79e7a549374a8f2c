//! Error types for cb-calendar

use thiserror::Error;

/// cb-calendar error type
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: HTTP {0}")]
    Authentication(u16),

    #[error("CalDAV request failed: HTTP {status} {body}")]
    Status { status: u16, body: String },

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("iCalendar parsing error: {0}")]
    ICalParse(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error(transparent)]
    Core(#[from] cb_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CalendarError>;

impl From<CalendarError> for cb_core::Error {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::EventNotFound(id) => cb_core::Error::NotFound(id),
            CalendarError::Core(inner) => inner,
            other => cb_core::Error::Provider(other.to_string()),
        }
    }
}
