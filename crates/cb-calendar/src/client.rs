//! CalDAV client implementation

use async_trait::async_trait;
use cb_core::{Event, Instant, Interval, IntervalStore};
use chrono::Utc;
use reqwest::{Client, Method, Response, StatusCode};
use tracing::{debug, error, info, warn};

use crate::error::{CalendarError, Result};
use crate::ical::{self, ParsedEvent};
use crate::models::CalDavConfig;
use crate::xml;

/// CalDAV-backed [`IntervalStore`]
pub struct CalDavClient {
    client: Client,
    config: CalDavConfig,
    base_url: String,
}

impl CalDavClient {
    /// Create a new CalDAV client
    pub fn new(config: CalDavConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CalendarError::Configuration(e.to_string()))?;

        let base_url = config.server_url.trim_end_matches('/').to_string();
        info!("Calendar client initialized for: {}", base_url);

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Events overlapping `[start, end)`, with free/busy flags
    pub async fn query_events(&self, calendar_id: &str, start: Instant, end: Instant) -> Result<Vec<ParsedEvent>> {
        let range = Interval::new(start, end)?;
        let url = self.collection_url(calendar_id);
        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <D:prop>
        <D:getetag/>
        <C:calendar-data/>
    </D:prop>
    <C:filter>
        <C:comp-filter name="VCALENDAR">
            <C:comp-filter name="VEVENT">
                <C:time-range start="{}" end="{}"/>
            </C:comp-filter>
        </C:comp-filter>
    </C:filter>
</C:calendar-query>"#,
            start.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ"),
            end.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ"),
        );

        debug!("Fetching events from: {}", url);
        let response = self
            .request(method("REPORT")?, &url)
            .header("Content-Type", "application/xml; charset=utf-8")
            .header("Depth", "1")
            .body(body)
            .send()
            .await
            .map_err(connection_error)?;
        let text = check_status(response, None).await?.text().await.map_err(connection_error)?;

        let mut events = Vec::new();
        for resource in xml::parse_event_report(&text)? {
            match ical::parse_vevent(&resource.ical, self.config.utc_offset) {
                Ok(mut parsed) => {
                    // deletion addresses the resource, so its name wins over the UID
                    if let Some(name) = resource.name {
                        parsed.event.id = Some(name);
                    }
                    parsed.event.interval = in_offset(parsed.event.interval, &start)?;
                    if parsed.event.interval.falls_in(&range) {
                        events.push(parsed);
                    }
                }
                Err(e) => warn!("Skipping unreadable event resource: {}", e),
            }
        }

        info!("Fetched {} events", events.len());
        Ok(events)
    }

    fn collection_url(&self, calendar_id: &str) -> String {
        format!("{}/{}/", self.base_url, calendar_id.trim_matches('/'))
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!("{}{}.ics", self.collection_url(calendar_id), event_id)
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        if self.config.username.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.config.username, Some(&self.config.password))
        }
    }
}

#[async_trait]
impl IntervalStore for CalDavClient {
    async fn list_busy(&self, calendar_id: &str, time_min: Instant, time_max: Instant) -> cb_core::Result<Vec<Interval>> {
        let events = self.query_events(calendar_id, time_min, time_max).await?;
        Ok(events
            .into_iter()
            .filter(ParsedEvent::is_busy)
            .map(|p| p.event.interval)
            .collect())
    }

    async fn list_events(&self, calendar_id: &str, time_min: Instant, time_max: Instant) -> cb_core::Result<Vec<Event>> {
        let events = self.query_events(calendar_id, time_min, time_max).await?;
        Ok(events.into_iter().map(|p| p.event).collect())
    }

    async fn create_event(&self, calendar_id: &str, event: Event) -> cb_core::Result<Event> {
        let uid = uuid::Uuid::new_v4().simple().to_string();
        let url = self.event_url(calendar_id, &uid);
        let body = ical::to_ical(&event, &uid, Utc::now());

        debug!("Creating event: {}", event.title);
        let response = self
            .request(Method::PUT, &url)
            .header("Content-Type", "text/calendar; charset=utf-8")
            .header("If-None-Match", "*")
            .body(body)
            .send()
            .await
            .map_err(connection_error)?;
        check_status(response, None).await?;

        info!("Created event: {}", uid);
        let mut created = event;
        created.id = Some(uid);
        Ok(created)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> cb_core::Result<()> {
        let url = self.event_url(calendar_id, event_id);

        debug!("Deleting event: {}", event_id);
        let response = self
            .request(Method::DELETE, &url)
            .send()
            .await
            .map_err(connection_error)?;
        check_status(response, Some(event_id)).await?;

        info!("Deleted event: {}", event_id);
        Ok(())
    }

    async fn calendar_name(&self, calendar_id: &str) -> cb_core::Result<String> {
        let body = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:propfind xmlns:D="DAV:">
    <D:prop>
        <D:displayname/>
    </D:prop>
</D:propfind>"#;

        let response = self
            .request(method("PROPFIND")?, &self.collection_url(calendar_id))
            .header("Content-Type", "application/xml; charset=utf-8")
            .header("Depth", "0")
            .body(body)
            .send()
            .await
            .map_err(connection_error)?;
        let text = check_status(response, None)
            .await?
            .text()
            .await
            .map_err(connection_error)?;

        Ok(xml::parse_displayname(&text)?.unwrap_or_else(|| calendar_id.to_string()))
    }
}

fn method(name: &str) -> Result<Method> {
    Method::from_bytes(name.as_bytes()).map_err(|e| CalendarError::Configuration(e.to_string()))
}

fn connection_error(e: reqwest::Error) -> CalendarError {
    error!("CalDAV connection failed: {}", e);
    CalendarError::Connection(e.to_string())
}

/// Pass successful responses through; `missing` names the event a 404/410 refers to
async fn check_status(response: Response, missing: Option<&str>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body, missing))
}

fn status_error(status: StatusCode, body: String, missing: Option<&str>) -> CalendarError {
    match (status, missing) {
        (StatusCode::NOT_FOUND | StatusCode::GONE, Some(id)) => CalendarError::EventNotFound(id.to_string()),
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            error!("CalDAV authentication failed: {}", status);
            CalendarError::Authentication(status.as_u16())
        }
        _ => {
            error!("CalDAV request failed: {} - {}", status, body);
            CalendarError::Status {
                status: status.as_u16(),
                body,
            }
        }
    }
}

/// Re-express an interval in the offset of `reference`
fn in_offset(interval: Interval, reference: &Instant) -> Result<Interval> {
    let offset = reference.offset();
    Ok(Interval::new(
        interval.start().with_timezone(offset),
        interval.end().with_timezone(offset),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use std::time::Duration;

    fn kst(h: u32) -> Instant {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, h, 0, 0)
            .unwrap()
    }

    fn client(url: &str) -> CalDavClient {
        CalDavClient::new(CalDavConfig::new(url, "me", "pw").with_timeout(Duration::from_millis(500))).unwrap()
    }

    #[test]
    fn test_urls() {
        let c = client("https://dav.example.com/calendars/me/");
        assert_eq!(c.collection_url("primary"), "https://dav.example.com/calendars/me/primary/");
        assert_eq!(
            c.event_url("/work/", "abc"),
            "https://dav.example.com/calendars/me/work/abc.ics"
        );
    }

    #[test]
    fn test_status_mapping() {
        let err = status_error(StatusCode::NOT_FOUND, String::new(), Some("abc"));
        assert!(matches!(err, CalendarError::EventNotFound(ref id) if id == "abc"));

        let err = status_error(StatusCode::NOT_FOUND, String::new(), None);
        assert!(matches!(err, CalendarError::Status { status: 404, .. }));

        let err = status_error(StatusCode::FORBIDDEN, String::new(), Some("abc"));
        assert!(matches!(err, CalendarError::Authentication(403)));

        let core: cb_core::Error = status_error(StatusCode::BAD_GATEWAY, "upstream".to_string(), None).into();
        assert!(matches!(core, cb_core::Error::Provider(_)));
    }

    #[test]
    fn test_in_offset() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let interval = Interval::new(kst(9).with_timezone(&utc), kst(10).with_timezone(&utc)).unwrap();
        let shifted = in_offset(interval, &kst(0)).unwrap();
        assert_eq!(shifted.start().format("%H:%M").to_string(), "09:00");
        assert_eq!(shifted, interval);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_provider_error() {
        let c = client("http://127.0.0.1:1");
        let err = c.list_busy("primary", kst(9), kst(19)).await.unwrap_err();
        assert!(matches!(err, cb_core::Error::Provider(_)));

        let err = c.delete_event("primary", "abc").await.unwrap_err();
        assert!(!err.is_not_found());
    }
}
