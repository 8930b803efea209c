use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A caller-owned, time-ranged calendar entry. Nothing in the layout engine checks that
/// `start <= end` or that ids are unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: String,

    pub title: String,

    pub start: DateTime<Utc>,

    pub end: DateTime<Utc>,

    #[serde(default)]
    pub facility: Option<String>,

    #[serde(default, alias = "color")]
    pub color_tag: Option<String>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
            facility: None,
            color_tag: None,
        }
    }

    pub fn with_facility(mut self, facility: impl Into<String>) -> Self {
        self.facility = Some(facility.into());
        self
    }

    pub fn with_color_tag(mut self, color_tag: impl Into<String>) -> Self {
        self.color_tag = Some(color_tag.into());
        self
    }

    /// `HH:MM - HH:MM` in `tz`, with the date prefixed on the end when the event finishes on
    /// another local day.
    pub fn time_range_label(&self, tz: Tz) -> String {
        let start = self.start.with_timezone(&tz);
        let end = self.end.with_timezone(&tz);
        if start.date_naive() == end.date_naive() {
            format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
        } else {
            format!(
                "{} - {}",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            )
        }
    }
}

/// Reads a JSON array of events from `path`.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_events(path: &Path) -> anyhow::Result<Vec<Event>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read events file {}", path.display()))?;

    if text.trim().is_empty() {
        warn!("events file is empty; rendering an empty calendar");
        return Ok(vec![]);
    }

    let events: Vec<Event> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse events file {}", path.display()))?;

    let inverted = events.iter().filter(|event| event.end < event.start).count();
    if inverted > 0 {
        debug!(inverted, "events with end before start will collapse to their start date");
    }

    info!(count = events.len(), "loaded events");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn deserializes_with_optional_fields() {
        let raw = r#"[
            {"id": "a", "title": "Standup", "start": "2025-06-15T08:00:00Z", "end": "2025-06-15T09:00:00Z"},
            {"id": "b", "title": "Offsite", "start": "2025-06-28T10:00:00Z", "end": "2025-06-30T14:00:00Z",
             "facility": "North Clinic", "color": "teal"}
        ]"#;
        let events: Vec<Event> = serde_json::from_str(raw).expect("parse events");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].facility, None);
        assert_eq!(events[1].facility.as_deref(), Some("North Clinic"));
        assert_eq!(events[1].color_tag.as_deref(), Some("teal"));
    }

    #[test]
    fn time_range_label_includes_dates_across_days() {
        let start = Utc.with_ymd_and_hms(2025, 6, 28, 10, 0, 0).single().expect("start");
        let end = Utc.with_ymd_and_hms(2025, 6, 30, 14, 0, 0).single().expect("end");

        let same_day = Event::new("a", "a", start, start);
        assert_eq!(same_day.time_range_label(chrono_tz::UTC), "10:00 - 10:00");

        let multi = Event::new("b", "b", start, end);
        assert_eq!(
            multi.time_range_label(chrono_tz::UTC),
            "2025-06-28 10:00 - 2025-06-30 14:00"
        );
    }
}
