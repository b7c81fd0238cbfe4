//! Calendar source reading an exported events file.
//!
//! Accepts the calendar API list shape (`{"items": [...]}`) or a bare JSON
//! array of events, and returns only events starting inside the query window.

use crate::ingest::normalize::{CalendarEvent, EventTime};
use crate::ingest::source::{CalendarQuery, CalendarSource, SourceError, SourceResult};
use chrono::{DateTime, NaiveDate};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExportDocument {
    Listing {
        #[serde(default)]
        items: Vec<CalendarEvent>,
    },
    Bare(Vec<CalendarEvent>),
}

/// Calendar events exported to a local JSON file.
#[derive(Debug, Clone)]
pub struct CalendarExportFile {
    path: PathBuf,
}

impl CalendarExportFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> SourceResult<Vec<CalendarEvent>> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let document: ExportDocument =
            serde_json::from_str(&text).map_err(|source| SourceError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(match document {
            ExportDocument::Listing { items } => items,
            ExportDocument::Bare(items) => items,
        })
    }
}

impl CalendarSource for CalendarExportFile {
    fn fetch_events(&self, query: &CalendarQuery) -> SourceResult<Vec<CalendarEvent>> {
        let all = self.read_all()?;
        let total = all.len();
        let events = all
            .into_iter()
            .filter(|event| starts_in_window(event, query))
            .collect::<Vec<_>>();

        info!(
            "event=calendar_fetch module=ingest status=ok calendar_id={} window_start={} window_end={} total={total} in_window={}",
            query.calendar_id,
            query.window.start,
            query.window.end,
            events.len()
        );
        Ok(events)
    }
}

/// Events whose start cannot be read are kept so the normalizer reports them.
fn starts_in_window(event: &CalendarEvent, query: &CalendarQuery) -> bool {
    match event.start.as_ref().and_then(start_date) {
        Some(date) => date >= query.window.start && date <= query.window.end,
        None => true,
    }
}

fn start_date(start: &EventTime) -> Option<NaiveDate> {
    if let Some(value) = start.date_time.as_deref() {
        return DateTime::parse_from_rfc3339(value.trim())
            .ok()
            .map(|at| at.date_naive());
    }
    start
        .date
        .as_deref()
        .and_then(|value| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::CalendarExportFile;
    use crate::ingest::source::{CalendarQuery, CalendarSource, SourceError};
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_export(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn filters_listing_to_query_window() {
        let file = write_export(
            r#"{"items": [
                {"id": "a", "summary": "Code", "start": {"dateTime": "2024-03-10T09:00:00Z"}, "end": {"dateTime": "2024-03-10T10:00:00Z"}},
                {"id": "b", "summary": "Old", "start": {"date": "2023-01-01"}, "end": {"date": "2023-01-02"}},
                {"id": "c", "summary": "Broken", "start": {"dateTime": "soon"}, "end": {"dateTime": "later"}}
            ]}"#,
        );
        let query = CalendarQuery::around(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), "primary", 30, 7);
        let events = CalendarExportFile::new(file.path()).fetch_events(&query).unwrap();
        let ids = events
            .iter()
            .filter_map(|event| event.id.clone())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn accepts_bare_array() {
        let file = write_export(r#"[{"id": "a", "start": {"date": "2024-03-10"}, "end": {"date": "2024-03-11"}}]"#);
        let query = CalendarQuery::around(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), "primary", 1, 1);
        let events = CalendarExportFile::new(file.path()).fetch_events(&query).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let query = CalendarQuery::around(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), "primary", 1, 1);
        let err = CalendarExportFile::new("/nonexistent/calendar.json")
            .fetch_events(&query)
            .unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
