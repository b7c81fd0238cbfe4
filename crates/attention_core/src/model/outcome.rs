//! Daily outcome metrics.
//!
//! # Responsibility
//! - Define the self-reported/derived daily wellbeing scores.
//! - Validate the 1-10 score range before persistence.
//!
//! # Invariants
//! - Every present score is within `1..=10`.
//! - At most one row exists per date (enforced by the store).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lowest accepted outcome score.
pub const MIN_SCORE: u8 = 1;
/// Highest accepted outcome score.
pub const MAX_SCORE: u8 = 10;

/// One of the four outcome dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Happiness,
    Peace,
    Freedom,
    WellBeing,
}

impl OutcomeKind {
    /// All outcome dimensions in reporting order.
    pub const ALL: [OutcomeKind; 4] = [
        Self::Happiness,
        Self::Peace,
        Self::Freedom,
        Self::WellBeing,
    ];

    /// Stable string id, matching the store column name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happiness => "happiness",
            Self::Peace => "peace",
            Self::Freedom => "freedom",
            Self::WellBeing => "well_being",
        }
    }
}

impl Display for OutcomeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeValidationError {
    OutOfRange {
        date: NaiveDate,
        kind: OutcomeKind,
        value: u8,
    },
}

impl Display for OutcomeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { date, kind, value } => write!(
                f,
                "{kind} score {value} on {date} is outside {MIN_SCORE}..={MAX_SCORE}"
            ),
        }
    }
}

impl Error for OutcomeValidationError {}

/// Daily outcome scores; `None` means unknown for that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeMetric {
    pub date: NaiveDate,
    #[serde(default)]
    pub happiness: Option<u8>,
    #[serde(default)]
    pub peace: Option<u8>,
    #[serde(default)]
    pub freedom: Option<u8>,
    #[serde(default)]
    pub well_being: Option<u8>,
}

impl OutcomeMetric {
    /// Creates an empty row for `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            happiness: None,
            peace: None,
            freedom: None,
            well_being: None,
        }
    }

    /// Returns the score for one dimension.
    pub fn value(&self, kind: OutcomeKind) -> Option<u8> {
        match kind {
            OutcomeKind::Happiness => self.happiness,
            OutcomeKind::Peace => self.peace,
            OutcomeKind::Freedom => self.freedom,
            OutcomeKind::WellBeing => self.well_being,
        }
    }

    /// Checks that every present score is within range.
    pub fn validate(&self) -> Result<(), OutcomeValidationError> {
        for kind in OutcomeKind::ALL {
            if let Some(value) = self.value(kind) {
                if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                    return Err(OutcomeValidationError::OutOfRange {
                        date: self.date,
                        kind,
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}
