//! Calendar provider selection

use std::sync::Arc;

use cb_calendar::{CalDavClient, CalDavConfig};
use cb_core::{Config, InMemoryStore, IntervalStore, ProviderKind};
use tracing::{info, warn};

/// Build the store named by `[calendar].provider`
pub fn build_store(config: &Config) -> anyhow::Result<Arc<dyn IntervalStore>> {
    match config.calendar.provider {
        ProviderKind::CalDav => {
            let caldav = CalDavConfig::from_settings(&config.calendar)?;
            info!("Using CalDAV calendar at {}", caldav.server_url);
            Ok(Arc::new(CalDavClient::new(caldav)?))
        }
        ProviderKind::Memory => {
            warn!("Using in-memory calendar; events are lost on exit");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_by_default() {
        let store = build_store(&Config::default()).unwrap();
        let name = store.calendar_name("primary").await.unwrap();
        assert_eq!(name, "primary (in-memory)");
    }

    #[test]
    fn test_caldav_requires_url() {
        let mut config = Config::default();
        config.calendar.provider = ProviderKind::CalDav;
        assert!(build_store(&config).is_err());

        config.calendar.server_url = Some("https://dav.example.com/calendars/me".to_string());
        assert!(build_store(&config).is_ok());
    }
}
