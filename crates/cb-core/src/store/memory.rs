//! In-memory interval store
//!
//! Lives only as long as the process. Used by the CLI without a provider
//! configured and by tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::IntervalStore;
use crate::error::Error;
use crate::types::{Event, Instant, Interval};
use crate::Result;

/// Events keyed by calendar id
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    calendars: Arc<RwLock<HashMap<String, Vec<Event>>>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event as-is, assigning an identifier when it has none
    pub async fn insert(&self, calendar_id: &str, mut event: Event) -> Event {
        if event.id.is_none() {
            event.id = Some(uuid::Uuid::new_v4().simple().to_string());
        }
        let mut calendars = self.calendars.write().await;
        calendars
            .entry(calendar_id.to_string())
            .or_default()
            .push(event.clone());
        event
    }

    /// Number of events held for a calendar
    pub async fn event_count(&self, calendar_id: &str) -> usize {
        let calendars = self.calendars.read().await;
        calendars.get(calendar_id).map_or(0, Vec::len)
    }

    async fn in_window(&self, calendar_id: &str, range: Interval) -> Vec<Event> {
        let calendars = self.calendars.read().await;
        calendars
            .get(calendar_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.interval.falls_in(&range))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl IntervalStore for InMemoryStore {
    async fn list_busy(&self, calendar_id: &str, time_min: Instant, time_max: Instant) -> Result<Vec<Interval>> {
        let range = Interval::new(time_min, time_max)?;
        let busy: Vec<Interval> = self
            .in_window(calendar_id, range)
            .await
            .into_iter()
            .filter(|e| !e.all_day)
            .map(|e| e.interval)
            .collect();
        debug!("{} busy intervals in {}", busy.len(), calendar_id);
        Ok(busy)
    }

    async fn list_events(&self, calendar_id: &str, time_min: Instant, time_max: Instant) -> Result<Vec<Event>> {
        let range = Interval::new(time_min, time_max)?;
        Ok(self.in_window(calendar_id, range).await)
    }

    async fn create_event(&self, calendar_id: &str, mut event: Event) -> Result<Event> {
        // identifiers always come from the store
        event.id = None;
        Ok(self.insert(calendar_id, event).await)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        let mut calendars = self.calendars.write().await;
        let events = calendars
            .get_mut(calendar_id)
            .ok_or_else(|| Error::NotFound(event_id.to_string()))?;

        let before = events.len();
        events.retain(|e| e.id.as_deref() != Some(event_id));
        if events.len() == before {
            return Err(Error::NotFound(event_id.to_string()));
        }
        Ok(())
    }

    async fn calendar_name(&self, calendar_id: &str) -> Result<String> {
        Ok(format!("{} (in-memory)", calendar_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn at(h: u32) -> Instant {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, h, 0, 0)
            .unwrap()
    }

    fn event(title: &str, from: u32, to: u32) -> Event {
        Event::new(title, Interval::new(at(from), at(to)).unwrap())
    }

    #[tokio::test]
    async fn test_create_assigns_identifier() {
        let store = InMemoryStore::new();
        let created = store
            .create_event("primary", event("Sync", 10, 11).with_id("caller-chosen"))
            .await
            .unwrap();
        let id = created.id.unwrap();
        assert_ne!(id, "caller-chosen");
        assert_eq!(store.event_count("primary").await, 1);
    }

    #[tokio::test]
    async fn test_list_is_range_filtered() {
        let store = InMemoryStore::new();
        store.insert("primary", event("morning", 9, 10)).await;
        store.insert("primary", event("noon", 12, 13)).await;
        store.insert("other", event("elsewhere", 9, 18)).await;

        let events = store.list_events("primary", at(10), at(12)).await.unwrap();
        assert!(events.is_empty());

        let busy = store.list_busy("primary", at(9), at(13)).await.unwrap();
        assert_eq!(busy.len(), 2);
    }

    #[tokio::test]
    async fn test_point_event_at_midnight_is_listed() {
        let store = InMemoryStore::new();
        store.insert("primary", event("Reminder", 0, 0)).await;

        let events = store.list_events("primary", at(0), at(23)).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Reminder");
    }

    #[tokio::test]
    async fn test_all_day_events_are_not_busy() {
        let store = InMemoryStore::new();
        store.insert("primary", event("holiday", 0, 23).all_day()).await;
        let busy = store.list_busy("primary", at(9), at(19)).await.unwrap();
        assert!(busy.is_empty());
        let events = store.list_events("primary", at(9), at(19)).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let store = InMemoryStore::new();
        let created = store.insert("primary", event("Sync", 10, 11)).await;

        let err = store.delete_event("primary", "nope").await.unwrap_err();
        assert!(err.is_not_found());
        let err = store.delete_event("missing-calendar", "nope").await.unwrap_err();
        assert!(err.is_not_found());

        store
            .delete_event("primary", created.id.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(store.event_count("primary").await, 0);
    }
}
