//! Raw collaborator records and their normalization into [`ActivityRecord`]s.
//!
//! # Responsibility
//! - Describe calendar events and journal entries as collaborators send them.
//! - Resolve timestamps (timed and all-day), clean text, normalize tags.
//! - Drop malformed records, reporting each drop, without failing the batch.
//!
//! # Invariants
//! - A record is either fully normalized or dropped; never half-built.
//! - Duration is derived from `end - start`, never trusted from input.
//! - Journal records are instants (`start == end`).
//! - Timed instants from every source are expressed in the run's time zone,
//!   so a record's date is the same local date whatever offset it arrived in.

use crate::model::activity::{
    ActivityRecord, ActivityValidationError, JournalRecord, RecordSource, SentimentScore,
};
use crate::report::Reporter;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MODULE: &str = "ingest";

/// Title used for calendar events without a summary.
pub const UNTITLED_EVENT: &str = "No Title";
/// Longest journal title kept, in characters.
pub const MAX_JOURNAL_TITLE_CHARS: usize = 80;

static MARKUP_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid markup tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Start or end of a calendar event. Exactly one field is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// RFC 3339 instant for timed events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// `YYYY-MM-DD` for all-day events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EventTime {
    pub fn timed(value: impl Into<String>) -> Self {
        Self {
            date_time: Some(value.into()),
            date: None,
        }
    }

    pub fn all_day(value: impl Into<String>) -> Self {
        Self {
            date_time: None,
            date: Some(value.into()),
        }
    }
}

/// Calendar event as exported by the calendar collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLocation {
    #[serde(default)]
    pub place_name: Option<String>,
}

/// Journal entry as exported by the journaling collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub location: Option<JournalLocation>,
    /// Passed through unchanged from the sentiment analyzer.
    #[serde(default)]
    pub sentiment: Option<SentimentScore>,
}

/// Why a raw record was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    MissingId,
    MissingTimestamp { id: String, field: &'static str },
    InvalidTimestamp { id: String, value: String },
    MixedBoundaries { id: String },
    EndBeforeStart { id: String },
}

impl NormalizeError {
    /// Short machine-readable reason used in reports.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingId => "missing_id",
            Self::MissingTimestamp { .. } => "missing_timestamp",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::MixedBoundaries { .. } => "mixed_boundaries",
            Self::EndBeforeStart { .. } => "end_before_start",
        }
    }

    fn id(&self) -> &str {
        match self {
            Self::MissingId => "",
            Self::MissingTimestamp { id, .. }
            | Self::InvalidTimestamp { id, .. }
            | Self::MixedBoundaries { id }
            | Self::EndBeforeStart { id } => id,
        }
    }
}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "record has no id"),
            Self::MissingTimestamp { id, field } => write!(f, "record {id} has no {field}"),
            Self::InvalidTimestamp { id, value } => {
                write!(f, "record {id} has unparseable timestamp `{value}`")
            }
            Self::MixedBoundaries { id } => {
                write!(f, "record {id} mixes all-day and timed boundaries")
            }
            Self::EndBeforeStart { id } => write!(f, "record {id} ends before it starts"),
        }
    }
}

impl Error for NormalizeError {}

impl From<ActivityValidationError> for NormalizeError {
    fn from(value: ActivityValidationError) -> Self {
        match value {
            ActivityValidationError::EmptyId => Self::MissingId,
            ActivityValidationError::EndBeforeStart { id } => Self::EndBeforeStart { id },
        }
    }
}

/// Batch normalization output.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub dropped: usize,
}

/// Normalizes one calendar event into `tz`: timed boundaries are converted,
/// all-day dates are taken at midnight.
pub fn normalize_calendar_event<Tz: TimeZone>(
    event: &CalendarEvent,
    tz: &Tz,
) -> Result<ActivityRecord, NormalizeError> {
    let id = required_id(event.id.as_deref())?;
    let start = event.start.as_ref().ok_or_else(|| NormalizeError::MissingTimestamp {
        id: id.clone(),
        field: "start",
    })?;
    let end = event.end.as_ref().ok_or_else(|| NormalizeError::MissingTimestamp {
        id: id.clone(),
        field: "end",
    })?;

    let (start, end) = match (start.date_time.as_deref(), end.date_time.as_deref()) {
        (Some(start), Some(end)) => (
            parse_instant(&id, start, tz)?,
            parse_instant(&id, end, tz)?,
        ),
        (None, None) => match (start.date.as_deref(), end.date.as_deref()) {
            (Some(start), Some(end)) => (
                local_midnight(&id, start, tz)?,
                local_midnight(&id, end, tz)?,
            ),
            (None, _) => {
                return Err(NormalizeError::MissingTimestamp {
                    id,
                    field: "start",
                })
            }
            (_, None) => return Err(NormalizeError::MissingTimestamp { id, field: "end" }),
        },
        _ => return Err(NormalizeError::MixedBoundaries { id }),
    };

    let title = event
        .summary
        .as_deref()
        .map(str::trim)
        .filter(|summary| !summary.is_empty())
        .unwrap_or(UNTITLED_EVENT);
    let description = clean_text(event.description.as_deref().unwrap_or_default());

    Ok(ActivityRecord::new(
        id,
        start,
        end,
        title,
        description,
        BTreeSet::new(),
        RecordSource::Calendar,
    )?)
}

/// Normalizes one journal entry into an instant record in `tz` plus metadata.
pub fn normalize_journal_entry<Tz: TimeZone>(
    entry: &JournalEntry,
    tz: &Tz,
) -> Result<JournalRecord, NormalizeError> {
    let id = required_id(entry.uuid.as_deref())?;
    let created = entry
        .creation_date
        .as_deref()
        .ok_or_else(|| NormalizeError::MissingTimestamp {
            id: id.clone(),
            field: "creationDate",
        })?;
    let at = parse_instant(&id, created, tz)?;
    let (title, body) = split_journal_text(&entry.text);

    let record = ActivityRecord::new(
        id,
        at,
        at,
        title,
        clean_text(body),
        normalize_tags(&entry.tags),
        RecordSource::Journal,
    )?;

    let location = entry
        .location
        .as_ref()
        .and_then(|location| location.place_name.as_deref())
        .map(str::trim)
        .filter(|place| !place.is_empty())
        .map(str::to_string);

    Ok(JournalRecord {
        record,
        location,
        sentiment: entry.sentiment.clone(),
    })
}

/// Normalizes a calendar batch in the process's local time zone.
pub fn normalize_calendar_events(
    events: &[CalendarEvent],
    reporter: &dyn Reporter,
) -> Normalized<ActivityRecord> {
    normalize_calendar_events_in(events, &Local, reporter)
}

/// Normalizes a calendar batch into `tz`.
pub fn normalize_calendar_events_in<Tz: TimeZone>(
    events: &[CalendarEvent],
    tz: &Tz,
    reporter: &dyn Reporter,
) -> Normalized<ActivityRecord> {
    collect_batch(
        events.iter().map(|event| normalize_calendar_event(event, tz)),
        RecordSource::Calendar,
        reporter,
    )
}

/// Normalizes a journal batch in the process's local time zone.
pub fn normalize_journal_entries(
    entries: &[JournalEntry],
    reporter: &dyn Reporter,
) -> Normalized<JournalRecord> {
    normalize_journal_entries_in(entries, &Local, reporter)
}

/// Normalizes a journal batch into `tz`.
pub fn normalize_journal_entries_in<Tz: TimeZone>(
    entries: &[JournalEntry],
    tz: &Tz,
    reporter: &dyn Reporter,
) -> Normalized<JournalRecord> {
    collect_batch(
        entries.iter().map(|entry| normalize_journal_entry(entry, tz)),
        RecordSource::Journal,
        reporter,
    )
}

fn collect_batch<T>(
    results: impl Iterator<Item = Result<T, NormalizeError>>,
    source: RecordSource,
    reporter: &dyn Reporter,
) -> Normalized<T> {
    let mut records = Vec::new();
    let mut dropped = 0;
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(err) => {
                dropped += 1;
                reporter.warn(
                    MODULE,
                    "record_dropped",
                    format!(
                        "status=skip source={} id={} reason={}",
                        source.as_str(),
                        err.id(),
                        err.reason()
                    ),
                );
            }
        }
    }

    reporter.info(
        MODULE,
        "normalize_done",
        format!(
            "status=ok source={} records={} dropped={dropped}",
            source.as_str(),
            records.len()
        ),
    );
    Normalized { records, dropped }
}

/// Strips markup tags and collapses whitespace.
pub fn clean_text(value: &str) -> String {
    let without_tags = MARKUP_TAG_RE.replace_all(value, " ");
    WHITESPACE_RE
        .replace_all(without_tags.trim(), " ")
        .into_owned()
}

/// Trims and lowercases tags, discarding empty ones.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> BTreeSet<String> {
    tags.iter()
        .map(|tag| tag.as_ref().trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Splits journal text into a title (first non-empty line) and the rest.
fn split_journal_text(text: &str) -> (String, &str) {
    let mut lines = text.split_inclusive('\n');
    let mut consumed = 0;
    for line in lines.by_ref() {
        consumed += line.len();
        let heading = line.trim().trim_start_matches('#').trim();
        if heading.is_empty() {
            continue;
        }
        let title = heading.chars().take(MAX_JOURNAL_TITLE_CHARS).collect();
        return (title, &text[consumed..]);
    }
    (String::new(), "")
}

fn required_id(id: Option<&str>) -> Result<String, NormalizeError> {
    id.map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(NormalizeError::MissingId)
}

fn parse_instant<Tz: TimeZone>(
    id: &str,
    value: &str,
    tz: &Tz,
) -> Result<DateTime<FixedOffset>, NormalizeError> {
    let at = DateTime::parse_from_rfc3339(value.trim()).map_err(|_| {
        NormalizeError::InvalidTimestamp {
            id: id.to_string(),
            value: value.to_string(),
        }
    })?;
    Ok(at.with_timezone(tz).fixed_offset())
}

fn local_midnight<Tz: TimeZone>(
    id: &str,
    value: &str,
    tz: &Tz,
) -> Result<DateTime<FixedOffset>, NormalizeError> {
    let invalid = || NormalizeError::InvalidTimestamp {
        id: id.to_string(),
        value: value.to_string(),
    };
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|at| at.fixed_offset())
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::{
        clean_text, normalize_calendar_event, normalize_calendar_events_in,
        normalize_journal_entries_in, normalize_journal_entry, CalendarEvent, EventTime, JournalEntry, NormalizeError,
        UNTITLED_EVENT,
    };
    use crate::report::RecordingReporter;
    use chrono::FixedOffset;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn timed(id: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent {
            id: Some(id.to_string()),
            summary: Some("Write blog post".to_string()),
            start: Some(EventTime::timed(start)),
            end: Some(EventTime::timed(end)),
            ..CalendarEvent::default()
        }
    }

    #[test]
    fn timed_event_is_converted_to_run_offset() {
        let event = timed("e1", "2024-03-01T23:00:00+02:00", "2024-03-02T00:30:00+02:00");
        let record = normalize_calendar_event(&event, &utc()).unwrap();
        assert_eq!(record.duration_minutes(), 90);
        assert_eq!(record.start().offset().local_minus_utc(), 0);
        assert_eq!(record.start().to_rfc3339(), "2024-03-01T21:00:00+00:00");
        assert_eq!(record.date().to_string(), "2024-03-01");
        assert_eq!(record.title(), "Write blog post");

        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let record = normalize_calendar_event(&event, &tokyo).unwrap();
        assert_eq!(record.date().to_string(), "2024-03-02");
    }

    #[test]
    fn calendar_and_journal_share_a_local_date_for_one_instant() {
        let pacific = FixedOffset::west_opt(7 * 3600).unwrap();
        let reporter = RecordingReporter::new();
        let events = vec![timed(
            "e5",
            "2024-04-01T20:00:00-07:00",
            "2024-04-01T21:00:00-07:00",
        )];
        let entries = vec![JournalEntry {
            uuid: Some("J0".to_string()),
            creation_date: Some("2024-04-02T03:00:00Z".to_string()),
            text: "Evening walk".to_string(),
            ..JournalEntry::default()
        }];

        let calendar = normalize_calendar_events_in(&events, &pacific, &reporter);
        let journal = normalize_journal_entries_in(&entries, &pacific, &reporter);

        let event = &calendar.records[0];
        let entry = &journal.records[0].record;
        assert_eq!(event.start(), entry.start());
        assert_eq!(event.date(), entry.date());
        assert_eq!(entry.date().to_string(), "2024-04-01");
        assert_eq!(entry.start().offset().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn all_day_event_spans_local_midnights() {
        let event = CalendarEvent {
            id: Some("e2".to_string()),
            start: Some(EventTime::all_day("2024-03-01")),
            end: Some(EventTime::all_day("2024-03-02")),
            ..CalendarEvent::default()
        };
        let tz = FixedOffset::east_opt(-5 * 3600).unwrap();
        let record = normalize_calendar_event(&event, &tz).unwrap();
        assert_eq!(record.duration_minutes(), 24 * 60);
        assert_eq!(record.date().to_string(), "2024-03-01");
        assert_eq!(record.title(), UNTITLED_EVENT);
    }

    #[test]
    fn mixed_and_reversed_boundaries_are_rejected() {
        let mixed = CalendarEvent {
            id: Some("e3".to_string()),
            start: Some(EventTime::all_day("2024-03-01")),
            end: Some(EventTime::timed("2024-03-01T10:00:00Z")),
            ..CalendarEvent::default()
        };
        assert!(matches!(
            normalize_calendar_event(&mixed, &utc()),
            Err(NormalizeError::MixedBoundaries { .. })
        ));

        let reversed = timed("e4", "2024-03-01T10:00:00Z", "2024-03-01T09:00:00Z");
        assert!(matches!(
            normalize_calendar_event(&reversed, &utc()),
            Err(NormalizeError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn batch_drops_bad_records_and_reports_them() {
        let events = vec![
            timed("ok", "2024-03-01T09:00:00Z", "2024-03-01T10:00:00Z"),
            timed("bad", "yesterday", "2024-03-01T10:00:00Z"),
            CalendarEvent::default(),
        ];
        let reporter = RecordingReporter::new();
        let batch = normalize_calendar_events_in(&events, &utc(), &reporter);

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.dropped, 2);
        assert_eq!(reporter.count("record_dropped"), 2);
        let details = reporter
            .events()
            .into_iter()
            .filter(|event| event.event == "record_dropped")
            .map(|event| event.detail)
            .collect::<Vec<_>>();
        assert!(details[0].contains("id=bad reason=invalid_timestamp"));
        assert!(details[1].contains("reason=missing_id"));
    }

    #[test]
    fn journal_entry_is_an_instant_with_heading_title() {
        let entry = JournalEntry {
            uuid: Some("J1".to_string()),
            creation_date: Some("2024-03-02T07:15:00Z".to_string()),
            text: "\n# Morning pages\nFelt <b>calm</b>\n\nafter a run".to_string(),
            tags: vec![" Gratitude ".to_string(), "".to_string()],
            ..JournalEntry::default()
        };
        let journal = normalize_journal_entry(&entry, &utc()).unwrap();
        let record = &journal.record;

        assert_eq!(record.title(), "Morning pages");
        assert_eq!(record.description(), "Felt calm after a run");
        assert_eq!(record.start(), record.end());
        assert_eq!(record.duration_minutes(), 0);
        assert_eq!(
            record.tags().iter().cloned().collect::<Vec<_>>(),
            vec!["gratitude".to_string()]
        );
    }

    #[test]
    fn journal_title_is_truncated() {
        let entry = JournalEntry {
            uuid: Some("J2".to_string()),
            creation_date: Some("2024-03-02T07:15:00Z".to_string()),
            text: "x".repeat(200),
            ..JournalEntry::default()
        };
        let journal = normalize_journal_entry(&entry, &utc()).unwrap();
        assert_eq!(journal.record.title().chars().count(), 80);
        assert_eq!(journal.record.description(), "");
    }

    #[test]
    fn clean_text_strips_markup() {
        assert_eq!(
            clean_text("Agenda:<br>item  one <a href=\"x\">link</a>"),
            "Agenda: item one link"
        );
    }
}
