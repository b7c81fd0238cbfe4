//! Attention domain labels.
//!
//! # Responsibility
//! - Define the fixed, ordered set of domains activity time is classified into.
//! - Provide stable string forms for storage and display.
//!
//! # Invariants
//! - Declaration order is the categorizer priority order; `Other` is last.
//! - `Ord` follows declaration order, so ordered maps iterate in priority order.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Attention category for a unit of tracked time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DomainLabel {
    /// Creating and producing work.
    Generation,
    /// Rest and recovery.
    Charging,
    /// Learning and skill building.
    Growth,
    /// Time with other people.
    Connection,
    /// Physical health.
    Vitality,
    /// Fallback when no keyword matches.
    Other,
}

impl DomainLabel {
    /// All labels in priority order, `Other` last.
    pub const ALL: [DomainLabel; 6] = [
        Self::Generation,
        Self::Charging,
        Self::Growth,
        Self::Connection,
        Self::Vitality,
        Self::Other,
    ];

    /// Labels that can be matched by keywords, in tie-break order.
    pub const MATCHABLE: [DomainLabel; 5] = [
        Self::Generation,
        Self::Charging,
        Self::Growth,
        Self::Connection,
        Self::Vitality,
    ];

    /// Stable string id used in storage and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generation => "Generation",
            Self::Charging => "Charging",
            Self::Growth => "Growth",
            Self::Connection => "Connection",
            Self::Vitality => "Vitality",
            Self::Other => "Other",
        }
    }

    /// Parses a stored label. Matching is exact.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == value)
    }
}

impl Display for DomainLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
