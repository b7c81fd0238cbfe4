//! Collaborator contracts for raw activity data.
//!
//! # Responsibility
//! - Define the calendar and journal source traits the pipeline calls.
//! - Define the query window passed to calendar sources.
//!
//! # Invariants
//! - Sources return raw records; normalization happens in the core.
//! - Source calls are synchronous; a failure fails only the calling step.

use crate::ingest::normalize::{CalendarEvent, JournalEntry};
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_DAYS_BACK: u32 = 90;
pub const DEFAULT_DAYS_FORWARD: u32 = 7;

pub type SourceResult<T> = Result<T, SourceError>;

/// Collaborator failure.
#[derive(Debug)]
pub enum SourceError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    NotFound(String),
    Unavailable(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "cannot parse {}: {source}", path.display())
            }
            Self::NotFound(message) => write!(f, "source not found: {message}"),
            Self::Unavailable(message) => write!(f, "source unavailable: {message}"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::NotFound(_) | Self::Unavailable(_) => None,
        }
    }
}

/// Inclusive date window requested from a calendar source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, at: DateTime<FixedOffset>) -> bool {
        let date = at.date_naive();
        date >= self.start && date <= self.end
    }
}

/// What a calendar source is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarQuery {
    pub calendar_id: String,
    pub days_back: u32,
    pub days_forward: u32,
    pub window: DateWindow,
}

impl CalendarQuery {
    /// Builds the query for `as_of - days_back ..= as_of + days_forward`.
    pub fn around(
        as_of: NaiveDate,
        calendar_id: impl Into<String>,
        days_back: u32,
        days_forward: u32,
    ) -> Self {
        let start = as_of
            .checked_sub_days(Days::new(u64::from(days_back)))
            .unwrap_or(NaiveDate::MIN);
        let end = as_of
            .checked_add_days(Days::new(u64::from(days_forward)))
            .unwrap_or(NaiveDate::MAX);
        Self {
            calendar_id: calendar_id.into(),
            days_back,
            days_forward,
            window: DateWindow { start, end },
        }
    }
}

pub trait CalendarSource {
    fn fetch_events(&self, query: &CalendarQuery) -> SourceResult<Vec<CalendarEvent>>;
}

pub trait JournalSource {
    fn load_entries(&self) -> SourceResult<Vec<JournalEntry>>;
}

/// Calendar source backed by an in-memory list; mainly for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCalendar {
    pub events: Vec<CalendarEvent>,
}

impl CalendarSource for StaticCalendar {
    fn fetch_events(&self, _query: &CalendarQuery) -> SourceResult<Vec<CalendarEvent>> {
        Ok(self.events.clone())
    }
}

/// Journal source backed by an in-memory list; mainly for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticJournal {
    pub entries: Vec<JournalEntry>,
}

impl JournalSource for StaticJournal {
    fn load_entries(&self) -> SourceResult<Vec<JournalEntry>> {
        Ok(self.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::CalendarQuery;
    use chrono::{DateTime, NaiveDate};

    #[test]
    fn query_window_spans_back_and_forward() {
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let query = CalendarQuery::around(as_of, "primary", 30, 7);
        assert_eq!(query.window.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(query.window.end, NaiveDate::from_ymd_opt(2024, 4, 7).unwrap());

        let inside = DateTime::parse_from_rfc3339("2024-04-07T23:00:00-05:00").unwrap();
        let outside = DateTime::parse_from_rfc3339("2024-02-29T23:59:00+00:00").unwrap();
        assert!(query.window.contains(inside));
        assert!(!query.window.contains(outside));
    }
}
