//! Calendar provider boundary
//!
//! The interpreter only sees this trait. Network access, credentials,
//! retries and timeouts all live in the implementations.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;

use crate::types::{Event, Instant, Interval};
use crate::Result;

/// Read/write access to a provider's intervals and events
///
/// Implementations report a missing event as [`crate::Error::NotFound`] and
/// every other failure as [`crate::Error::Provider`].
#[async_trait]
pub trait IntervalStore: Send + Sync {
    /// Busy intervals touching `[time_min, time_max)`, in any order
    async fn list_busy(&self, calendar_id: &str, time_min: Instant, time_max: Instant) -> Result<Vec<Interval>>;

    /// Events touching `[time_min, time_max)`
    async fn list_events(&self, calendar_id: &str, time_min: Instant, time_max: Instant) -> Result<Vec<Event>>;

    /// Persist a new event and return it with its identifier set
    async fn create_event(&self, calendar_id: &str, event: Event) -> Result<Event>;

    /// Delete an event by identifier
    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()>;

    /// Display name of the calendar, used for health checks
    async fn calendar_name(&self, calendar_id: &str) -> Result<String>;
}
