//! Error types for cb-core

use thiserror::Error;

/// Main error type for cb-core
#[derive(Error, Debug)]
pub enum Error {
    /// Date/time text that no parsing rule recognized
    #[error("Could not parse date/time: {0}")]
    Parse(String),

    /// A command keyword matched but the arguments had the wrong shape
    #[error("Usage: {0}")]
    Usage(String),

    /// The provider reported that the requested item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other failure reported by the calendar provider
    #[error("Calendar provider error: {0}")]
    Provider(String),

    #[error("Invalid interval: start {start} is after end {end}")]
    InvalidInterval { start: String, end: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the 404-equivalent provider condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for cb-core
pub type Result<T> = std::result::Result<T, Error>;
