//! WebDAV multistatus parsing

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{CalendarError, Result};
use crate::models::EventResource;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Href,
    CalendarData,
    DisplayName,
}

/// Event resources from a `calendar-query` REPORT response
pub fn parse_event_report(body: &str) -> Result<Vec<EventResource>> {
    let mut resources = Vec::new();
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut field = Field::None;
    let mut href = String::new();
    let mut data = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"response" => {
                    href.clear();
                    data.clear();
                }
                b"href" => field = Field::Href,
                b"calendar-data" => field = Field::CalendarData,
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"response" => {
                    if !data.trim().is_empty() {
                        resources.push(EventResource {
                            name: resource_name(&href),
                            ical: std::mem::take(&mut data),
                        });
                    }
                }
                b"href" | b"calendar-data" => field = Field::None,
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|e| CalendarError::XmlParse(e.to_string()))?;
                match field {
                    Field::Href => href.push_str(&text),
                    Field::CalendarData => data.push_str(&text),
                    _ => {}
                }
            }
            Ok(Event::CData(ref e)) if field == Field::CalendarData => {
                data.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CalendarError::XmlParse(e.to_string())),
            _ => {}
        }
    }

    Ok(resources)
}

/// First non-empty `displayname` in a PROPFIND response
pub fn parse_displayname(body: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut field = Field::None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"displayname" => {
                field = Field::DisplayName;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"displayname" => {
                field = Field::None;
            }
            Ok(Event::Text(ref e)) if field == Field::DisplayName => {
                let text = e.unescape().map_err(|e| CalendarError::XmlParse(e.to_string()))?;
                if !text.trim().is_empty() {
                    return Ok(Some(text.trim().to_string()));
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(CalendarError::XmlParse(e.to_string())),
            _ => {}
        }
    }
}

/// Last path segment of an href without its `.ics` suffix
fn resource_name(href: &str) -> Option<String> {
    let segment = href.trim().trim_end_matches('/').rsplit('/').next()?;
    let name = segment.strip_suffix(".ics").unwrap_or(segment);
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/calendars/me/primary/abc-123.ics</d:href>
    <d:propstat>
      <d:prop>
        <d:getetag>"1"</d:getetag>
        <cal:calendar-data>BEGIN:VCALENDAR
BEGIN:VEVENT
UID:abc-123
SUMMARY:Standup &amp; sync
DTSTART:20240115T000000Z
DTEND:20240115T003000Z
END:VEVENT
END:VCALENDAR</cal:calendar-data>
      </d:prop>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/calendars/me/primary/other.ics</d:href>
    <d:propstat>
      <d:prop>
        <cal:calendar-data><![CDATA[BEGIN:VCALENDAR
BEGIN:VEVENT
UID:server-generated
SUMMARY:Lunch
DTSTART:20240115T030000Z
END:VEVENT
END:VCALENDAR]]></cal:calendar-data>
      </d:prop>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/calendars/me/primary/</d:href>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn test_parse_event_report() {
        let resources = parse_event_report(REPORT).unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].name.as_deref(), Some("abc-123"));
        assert!(resources[0].ical.contains("SUMMARY:Standup & sync"));
        assert_eq!(resources[1].name.as_deref(), Some("other"));
        assert!(resources[1].ical.contains("UID:server-generated"));
    }

    #[test]
    fn test_parse_displayname() {
        let body = r#"<d:multistatus xmlns:d="DAV:"><d:response><d:href>/c/</d:href>
<d:propstat><d:prop><d:displayname>업무 캘린더</d:displayname></d:prop></d:propstat>
</d:response></d:multistatus>"#;
        assert_eq!(parse_displayname(body).unwrap().as_deref(), Some("업무 캘린더"));
        assert_eq!(parse_displayname("<d:multistatus xmlns:d=\"DAV:\"/>").unwrap(), None);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(parse_event_report("<d:multistatus><d:response></d:multistatus>").is_err());
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(resource_name("/a/b/x.ics").as_deref(), Some("x"));
        assert_eq!(resource_name("/a/b/").as_deref(), Some("b"));
        assert_eq!(resource_name("").as_deref(), None);
    }
}
