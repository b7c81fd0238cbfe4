//! Recommendation, schedule action and insight output shapes.
//!
//! # Invariants
//! - `Priority` orders `High < Medium < Low`, so an ascending sort puts the
//!   most urgent items first.
//! - Percentages are within `0.0..=100.0`.

use crate::model::domain::DomainLabel;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Suggested change to a domain's time allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Increase,
    Maintain,
    Optimize,
    Decrease,
    Review,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Maintain => "maintain",
            Self::Optimize => "optimize",
            Self::Decrease => "decrease",
            Self::Review => "review",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommendation urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actionable allocation change for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub domain: DomainLabel,
    pub action: Action,
    pub reason: String,
    pub current_percentage: f64,
    pub suggested_percentage: f64,
    pub priority: Priority,
}

/// Which schedule rule produced an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleActionKind {
    /// Generation outweighs Charging by more than the allowed ratio.
    ChargingBreaks,
    /// The start hour carrying the most Generation minutes.
    PeakHour,
    /// A domain with no tracked time in the period.
    DomainGap,
}

/// Concrete calendar change, independent of correlations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAction {
    pub kind: ScheduleActionKind,
    pub message: String,
}

impl ScheduleAction {
    pub fn new(kind: ScheduleActionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Which insight check produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    TimeOfDay,
    Balance,
    Streak,
    Diversity,
    Default,
}

/// Qualitative, human-readable observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

impl Insight {
    pub fn new(kind: InsightKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
