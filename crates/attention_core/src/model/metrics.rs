//! Derived allocation and correlation rows.

use crate::model::domain::DomainLabel;
use crate::model::outcome::OutcomeKind;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Share of one day's tracked time spent in one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAllocation {
    pub date: NaiveDate,
    pub domain: DomainLabel,
    pub absolute_minutes: i64,
    /// `0.0..=100.0`; sums to 100 across a date's rows.
    pub percentage_of_day: f64,
}

/// Share of a whole period's tracked time spent in one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainShare {
    pub domain: DomainLabel,
    pub minutes: i64,
    pub percentage: f64,
}

/// How often one primary emotion was recorded on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEmotion {
    pub date: NaiveDate,
    /// Lowercased emotion label as supplied by the sentiment analyzer.
    pub emotion: String,
    pub entries: usize,
    /// `entries` over all journal entries of the date, in `0.0..=1.0`.
    pub share: f64,
}

/// Pearson coefficient for one `(domain, metric)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub domain: DomainLabel,
    pub metric: OutcomeKind,
    /// Rounded to two decimals, within `[-1.0, 1.0]`.
    pub coefficient: f64,
    /// Number of paired dates the coefficient was computed from.
    pub samples: usize,
}

/// Output of one correlation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    /// Every computed pair, in domain then metric order.
    pub matrix: Vec<CorrelationResult>,
    /// Pairs above the positive threshold, strongest first.
    pub positive: Vec<CorrelationResult>,
    /// Pairs below the negative threshold, strongest first.
    pub negative: Vec<CorrelationResult>,
}

impl CorrelationReport {
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}
