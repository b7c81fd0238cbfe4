//! Activity record model.
//!
//! # Responsibility
//! - Define the unified record shape produced from calendar and journal input.
//! - Carry the domain label once a record has been classified.
//!
//! # Invariants
//! - `id` is never blank.
//! - `end` is never earlier than `start`; duration is derived, never stored.
//! - Records are immutable after construction.

use crate::model::domain::DomainLabel;
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Collaborator a record originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Calendar,
    Journal,
}

impl RecordSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Journal => "journal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "calendar" => Some(Self::Calendar),
            "journal" => Some(Self::Journal),
            _ => None,
        }
    }
}

/// Construction-time validation errors for [`ActivityRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityValidationError {
    EmptyId,
    EndBeforeStart { id: String },
}

impl Display for ActivityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "activity id cannot be empty"),
            Self::EndBeforeStart { id } => {
                write!(f, "activity `{id}` ends before it starts")
            }
        }
    }
}

impl Error for ActivityValidationError {}

/// Unified activity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    id: String,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    title: String,
    description: String,
    tags: BTreeSet<String>,
    source: RecordSource,
}

impl ActivityRecord {
    /// Builds a record after checking the id and time-range invariants.
    pub fn new(
        id: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        title: impl Into<String>,
        description: impl Into<String>,
        tags: BTreeSet<String>,
        source: RecordSource,
    ) -> Result<Self, ActivityValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ActivityValidationError::EmptyId);
        }
        if end < start {
            return Err(ActivityValidationError::EndBeforeStart { id });
        }

        Ok(Self {
            id,
            start,
            end,
            title: title.into(),
            description: description.into(),
            tags,
            source,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn source(&self) -> RecordSource {
        self.source
    }

    /// Whole minutes between `start` and `end`; seconds are truncated.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Local calendar date of `start`.
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Start time as fractional hours since local midnight, in `[0, 24)`.
    pub fn start_hour_fraction(&self) -> f64 {
        f64::from(self.start.hour()) + f64::from(self.start.minute()) / 60.0
    }
}

/// An activity record together with its assigned domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedRecord {
    pub record: ActivityRecord,
    pub domain: DomainLabel,
}

impl ClassifiedRecord {
    pub fn new(record: ActivityRecord, domain: DomainLabel) -> Self {
        Self { record, domain }
    }

    pub fn date(&self) -> NaiveDate {
        self.record.date()
    }

    pub fn minutes(&self) -> i64 {
        self.record.duration_minutes()
    }
}

/// Sentiment scores supplied by the external analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// `-1.0` (negative) to `1.0` (positive).
    pub polarity: f64,
    /// `0.0` (objective) to `1.0` (subjective).
    #[serde(default)]
    pub subjectivity: f64,
    /// Detected primary emotion, e.g. `joy`.
    #[serde(default)]
    pub emotion: Option<String>,
}

/// Normalized journal entry.
///
/// The activity record is a point in time (`start == end`), so journal
/// entries never contribute tracked minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalRecord {
    pub record: ActivityRecord,
    pub location: Option<String>,
    pub sentiment: Option<SentimentScore>,
}
