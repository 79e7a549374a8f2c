//! cb-calendar: CalDAV calendar provider for cb-gateway
//!
//! Implements [`cb_core::IntervalStore`] over CalDAV: `calendar-query`
//! REPORTs for listing, PUT/DELETE of `.ics` resources for writes and a
//! PROPFIND for the calendar's display name.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cb_calendar::{CalDavClient, CalDavConfig};
//!
//! let config = CalDavConfig::new("https://dav.example.com/calendars/me", "me", "secret");
//! let store: Arc<dyn IntervalStore> = Arc::new(CalDavClient::new(config)?);
//! ```

pub mod client;
pub mod error;
pub mod ical;
pub mod models;
pub mod xml;

pub use client::CalDavClient;
pub use error::{CalendarError, Result};
pub use models::{CalDavConfig, EventResource};
