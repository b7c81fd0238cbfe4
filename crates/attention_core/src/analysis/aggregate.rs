//! Time-allocation aggregation.
//!
//! # Responsibility
//! - Daily per-domain allocation, period and rolling-window shares.
//! - Time-of-day bucketing and the Generation streak walk.
//! - Pivot daily allocation into a date x domain minutes table.
//!
//! # Invariants
//! - Minutes are summed as integers in ordered maps, so results do not depend
//!   on input order.
//! - A date whose total is zero produces no allocation rows.
//! - Percentages of a date's rows sum to 100 (floating-point rounding aside).

use crate::model::activity::ClassifiedRecord;
use crate::model::domain::DomainLabel;
use crate::model::metrics::{DailyAllocation, DomainShare};
use chrono::{Days, NaiveDate, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// Part of the day a record started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TimeOfDay {
    /// `[0, 12)`
    Morning,
    /// `[12, 17)`
    Afternoon,
    /// `[17, 24)`
    Evening,
}

impl TimeOfDay {
    /// Buckets an hour-of-day fraction. `None` outside `[0, 24)`.
    pub fn from_hour_fraction(hour: f64) -> Option<Self> {
        if !(0.0..24.0).contains(&hour) {
            return None;
        }
        if hour < 12.0 {
            Some(Self::Morning)
        } else if hour < 17.0 {
            Some(Self::Afternoon)
        } else {
            Some(Self::Evening)
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
        }
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current and longest qualifying-day runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    /// Run length ending at the last walked date.
    pub current: u32,
    /// Longest run seen during the walk.
    pub longest: u32,
}

/// Per-date, per-domain minutes; absent where a domain had no time that day.
///
/// Every date in the table had some tracked time, so an absent cell reads as
/// 0 minutes for that date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyMinutesTable {
    rows: BTreeMap<NaiveDate, BTreeMap<DomainLabel, i64>>,
}

impl DailyMinutesTable {
    /// Dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    /// Every domain present on at least one date, in priority order.
    pub fn domains(&self) -> BTreeSet<DomainLabel> {
        self.rows
            .values()
            .flat_map(|row| row.keys().copied())
            .collect()
    }

    pub fn minutes(&self, date: NaiveDate, domain: DomainLabel) -> Option<i64> {
        self.rows.get(&date).and_then(|row| row.get(&domain)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Groups records by `(date, domain)` and computes each domain's share of the
/// day.
pub fn daily_allocation(records: &[ClassifiedRecord]) -> Vec<DailyAllocation> {
    let mut minutes_by_key = BTreeMap::<(NaiveDate, DomainLabel), i64>::new();
    let mut totals = BTreeMap::<NaiveDate, i64>::new();

    for item in records {
        let minutes = item.minutes().max(0);
        *minutes_by_key.entry((item.date(), item.domain)).or_insert(0) += minutes;
        *totals.entry(item.date()).or_insert(0) += minutes;
    }

    minutes_by_key
        .into_iter()
        .filter_map(|((date, domain), minutes)| {
            let total = totals.get(&date).copied().unwrap_or(0);
            if total <= 0 {
                return None;
            }
            Some(DailyAllocation {
                date,
                domain,
                absolute_minutes: minutes,
                percentage_of_day: minutes as f64 / total as f64 * 100.0,
            })
        })
        .collect()
}

/// Pivots allocation rows into a date x domain table.
pub fn daily_minutes_table(allocations: &[DailyAllocation]) -> DailyMinutesTable {
    let mut rows = BTreeMap::<NaiveDate, BTreeMap<DomainLabel, i64>>::new();
    for row in allocations {
        *rows
            .entry(row.date)
            .or_default()
            .entry(row.domain)
            .or_insert(0) += row.absolute_minutes;
    }
    DailyMinutesTable { rows }
}

/// Total minutes per domain over every record given.
pub fn domain_totals(records: &[ClassifiedRecord]) -> BTreeMap<DomainLabel, i64> {
    let mut minutes_by_domain = BTreeMap::<DomainLabel, i64>::new();
    for item in records {
        *minutes_by_domain.entry(item.domain).or_insert(0) += item.minutes().max(0);
    }
    minutes_by_domain
}

/// Domain shares over every record given. Empty when nothing was tracked.
pub fn period_shares(records: &[ClassifiedRecord]) -> Vec<DomainShare> {
    let minutes_by_domain = domain_totals(records);

    let total: i64 = minutes_by_domain.values().sum();
    if total <= 0 {
        return Vec::new();
    }

    minutes_by_domain
        .into_iter()
        .map(|(domain, minutes)| DomainShare {
            domain,
            minutes,
            percentage: minutes as f64 / total as f64 * 100.0,
        })
        .collect()
}

/// Domain shares over the trailing window `(as_of - window_days, as_of]`.
pub fn rolling_allocation(
    records: &[ClassifiedRecord],
    as_of: NaiveDate,
    window_days: u32,
) -> Vec<DomainShare> {
    let window_start = as_of
        .checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MIN);
    let in_window = records
        .iter()
        .filter(|item| item.date() > window_start && item.date() <= as_of)
        .cloned()
        .collect::<Vec<_>>();
    period_shares(&in_window)
}

/// Generation minutes per time-of-day bucket; buckets without time are
/// absent.
pub fn generation_minutes_by_time_of_day(
    records: &[ClassifiedRecord],
) -> BTreeMap<TimeOfDay, i64> {
    let mut buckets = BTreeMap::new();
    for item in records
        .iter()
        .filter(|item| item.domain == DomainLabel::Generation)
    {
        if let Some(bucket) = TimeOfDay::from_hour_fraction(item.record.start_hour_fraction()) {
            *buckets.entry(bucket).or_insert(0) += item.minutes().max(0);
        }
    }
    buckets.retain(|_, minutes| *minutes > 0);
    buckets
}

/// Generation minutes per local start hour (`0..24`); hours without time are
/// absent.
pub fn generation_minutes_by_hour(records: &[ClassifiedRecord]) -> BTreeMap<u32, i64> {
    let mut hours = BTreeMap::new();
    for item in records
        .iter()
        .filter(|item| item.domain == DomainLabel::Generation)
    {
        *hours.entry(item.record.start().hour()).or_insert(0) += item.minutes().max(0);
    }
    hours.retain(|_, minutes| *minutes > 0);
    hours
}

/// Walks every date from the first to the last date with Generation time.
///
/// A date counts when its Generation minutes exceed `threshold_minutes`. Any
/// other date, including a date with no records at all, resets the run.
pub fn generation_streak(records: &[ClassifiedRecord], threshold_minutes: i64) -> StreakSummary {
    let mut daily = BTreeMap::<NaiveDate, i64>::new();
    for item in records
        .iter()
        .filter(|item| item.domain == DomainLabel::Generation)
    {
        *daily.entry(item.date()).or_insert(0) += item.minutes().max(0);
    }

    let (Some(first), Some(last)) = (
        daily.keys().next().copied(),
        daily.keys().next_back().copied(),
    ) else {
        return StreakSummary::default();
    };

    let mut summary = StreakSummary::default();
    for date in first.iter_days().take_while(|date| *date <= last) {
        let minutes = daily.get(&date).copied().unwrap_or(0);
        if minutes > threshold_minutes {
            summary.current += 1;
            summary.longest = summary.longest.max(summary.current);
        } else {
            summary.current = 0;
        }
    }
    summary
}
