//! Qualitative insights over a period of classified records.
//!
//! # Responsibility
//! - Run the time-of-day, balance, streak and diversity checks in fixed
//!   order and yield their messages lazily.
//!
//! # Invariants
//! - Each check runs only when the consumer pulls past the previous one.
//! - A check that cannot be computed is skipped; later checks still run.
//! - At least one insight is always produced; the default message appears
//!   only when no check produced anything.

use crate::analysis::aggregate::{
    generation_minutes_by_time_of_day, generation_streak, period_shares, TimeOfDay,
};
use crate::config::AggregationConfig;
use crate::model::activity::ClassifiedRecord;
use crate::model::advice::{Insight, InsightKind};
use crate::model::domain::DomainLabel;
use crate::report::Reporter;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::iter::FusedIterator;

const MODULE: &str = "insight";

pub const MIN_STREAK_DAYS: u32 = 3;
pub const MAX_LOW_DIVERSITY_DOMAINS: usize = 2;
pub const GENERATION_HEAVY_PERCENT: f64 = 60.0;
pub const CHARGING_LIGHT_PERCENT: f64 = 20.0;

pub const DEFAULT_INSIGHT: &str =
    "Not enough data for meaningful patterns yet. Continue tracking your time for more insights.";

/// Reason a single check produced no result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightError {
    /// The period has no tracked minutes, so shares are undefined.
    EmptyPeriod { check: &'static str },
}

impl Display for InsightError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPeriod { check } => {
                write!(f, "{check} check needs tracked time in the period")
            }
        }
    }
}

impl Error for InsightError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    TimeOfDay,
    Balance,
    Streak,
    Diversity,
    Default,
    Done,
}

/// Lazy insight sequence for one period.
///
/// Consumed by value; once exhausted it keeps returning `None`.
pub struct Insights<'a> {
    records: &'a [ClassifiedRecord],
    config: &'a AggregationConfig,
    reporter: &'a dyn Reporter,
    stage: Stage,
    pending: VecDeque<Insight>,
    produced: usize,
}

impl<'a> Insights<'a> {
    pub fn new(
        records: &'a [ClassifiedRecord],
        config: &'a AggregationConfig,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            records,
            config,
            reporter,
            stage: Stage::TimeOfDay,
            pending: VecDeque::new(),
            produced: 0,
        }
    }

    fn run_stage(&mut self) {
        let (check, outcome) = match self.stage {
            Stage::TimeOfDay => ("time_of_day", Ok(time_of_day_check(self.records))),
            Stage::Balance => ("balance", balance_check(self.records)),
            Stage::Streak => ("streak", Ok(streak_check(self.records, self.config))),
            Stage::Diversity => ("diversity", diversity_check(self.records)),
            Stage::Default => {
                if self.produced == 0 {
                    self.pending
                        .push_back(Insight::new(InsightKind::Default, DEFAULT_INSIGHT));
                }
                self.stage = Stage::Done;
                return;
            }
            Stage::Done => return,
        };

        match outcome {
            Ok(insights) => self.pending.extend(insights),
            Err(err) => self.reporter.debug(
                MODULE,
                "check_skipped",
                format!("status=skip check={check} reason={err}"),
            ),
        }
        self.stage = next_stage(self.stage);
    }
}

impl Iterator for Insights<'_> {
    type Item = Insight;

    fn next(&mut self) -> Option<Insight> {
        loop {
            if let Some(insight) = self.pending.pop_front() {
                self.produced += 1;
                return Some(insight);
            }
            if self.stage == Stage::Done {
                return None;
            }
            self.run_stage();
        }
    }
}

impl FusedIterator for Insights<'_> {}

/// Convenience constructor mirroring the other analysis entry points.
pub fn insights<'a>(
    records: &'a [ClassifiedRecord],
    config: &'a AggregationConfig,
    reporter: &'a dyn Reporter,
) -> Insights<'a> {
    Insights::new(records, config, reporter)
}

fn next_stage(stage: Stage) -> Stage {
    match stage {
        Stage::TimeOfDay => Stage::Balance,
        Stage::Balance => Stage::Streak,
        Stage::Streak => Stage::Diversity,
        Stage::Diversity => Stage::Default,
        Stage::Default | Stage::Done => Stage::Done,
    }
}

fn time_of_day_check(records: &[ClassifiedRecord]) -> Vec<Insight> {
    let buckets = generation_minutes_by_time_of_day(records);
    let mut best: Option<(TimeOfDay, i64)> = None;
    for (bucket, minutes) in buckets {
        if best.map_or(true, |(_, top)| minutes > top) {
            best = Some((bucket, minutes));
        }
    }

    best.map(|(bucket, _)| {
        Insight::new(
            InsightKind::TimeOfDay,
            format!(
                "You're most productive during {bucket} hours. Consider scheduling high-value Generation activities during this time."
            ),
        )
    })
    .into_iter()
    .collect()
}

fn balance_check(records: &[ClassifiedRecord]) -> Result<Vec<Insight>, InsightError> {
    let shares = period_shares(records);
    if shares.is_empty() {
        return Err(InsightError::EmptyPeriod { check: "balance" });
    }
    let share_of = |domain: DomainLabel| {
        shares
            .iter()
            .find(|share| share.domain == domain)
            .map_or(0.0, |share| share.percentage)
    };

    let mut found = Vec::new();
    let generation = share_of(DomainLabel::Generation);
    if generation > GENERATION_HEAVY_PERCENT {
        found.push(Insight::new(
            InsightKind::Balance,
            format!(
                "You're spending {generation:.1}% of your time on Generation activities. Consider increasing Charging time to maintain energy levels."
            ),
        ));
    }
    let charging = share_of(DomainLabel::Charging);
    if charging < CHARGING_LIGHT_PERCENT {
        found.push(Insight::new(
            InsightKind::Balance,
            format!(
                "You're only spending {charging:.1}% of your time on Charging activities. This may lead to burnout. Try to allocate at least 20% for recovery."
            ),
        ));
    }
    Ok(found)
}

fn streak_check(records: &[ClassifiedRecord], config: &AggregationConfig) -> Vec<Insight> {
    let streak = generation_streak(records, config.streak_threshold_minutes);
    if streak.current < MIN_STREAK_DAYS {
        return Vec::new();
    }
    vec![Insight::new(
        InsightKind::Streak,
        format!(
            "You've maintained {} consecutive days with significant Generation time. Great consistency!",
            streak.current
        ),
    )]
}

fn diversity_check(records: &[ClassifiedRecord]) -> Result<Vec<Insight>, InsightError> {
    let shares = period_shares(records);
    if shares.is_empty() {
        return Err(InsightError::EmptyPeriod { check: "diversity" });
    }
    let active = shares.iter().filter(|share| share.minutes > 0).count();
    if active > MAX_LOW_DIVERSITY_DOMAINS {
        return Ok(Vec::new());
    }
    Ok(vec![Insight::new(
        InsightKind::Diversity,
        "Your attention portfolio lacks diversity. Consider allocating time to more domains for better balance.",
    )])
}

#[cfg(test)]
mod tests {
    use super::{insights, DEFAULT_INSIGHT};
    use crate::config::AggregationConfig;
    use crate::model::activity::{ActivityRecord, ClassifiedRecord, RecordSource};
    use crate::model::advice::InsightKind;
    use crate::model::domain::DomainLabel;
    use crate::report::RecordingReporter;
    use chrono::DateTime;
    use std::collections::BTreeSet;

    fn record(id: &str, start: &str, minutes: i64, domain: DomainLabel) -> ClassifiedRecord {
        let start = DateTime::parse_from_rfc3339(start).unwrap();
        let end = start + chrono::Duration::minutes(minutes);
        let record = ActivityRecord::new(
            id,
            start,
            end,
            id,
            "",
            BTreeSet::new(),
            RecordSource::Calendar,
        )
        .unwrap();
        ClassifiedRecord::new(record, domain)
    }

    #[test]
    fn empty_period_yields_only_default() {
        let config = AggregationConfig::default();
        let reporter = RecordingReporter::new();
        let all = insights(&[], &config, &reporter).collect::<Vec<_>>();

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].kind, InsightKind::Default);
        assert_eq!(all[0].message, DEFAULT_INSIGHT);
        assert_eq!(reporter.count("check_skipped"), 2);
    }

    #[test]
    fn checks_run_in_fixed_order() {
        let records = vec![
            record("a", "2024-04-01T09:00:00+00:00", 180, DomainLabel::Generation),
            record("b", "2024-04-02T09:00:00+00:00", 180, DomainLabel::Generation),
            record("c", "2024-04-03T09:00:00+00:00", 180, DomainLabel::Generation),
            record("d", "2024-04-03T20:00:00+00:00", 30, DomainLabel::Charging),
        ];
        let config = AggregationConfig::default();
        let reporter = RecordingReporter::new();
        let kinds = insights(&records, &config, &reporter)
            .map(|insight| insight.kind)
            .collect::<Vec<_>>();

        assert_eq!(
            kinds,
            vec![
                InsightKind::TimeOfDay,
                InsightKind::Balance,
                InsightKind::Balance,
                InsightKind::Streak,
                InsightKind::Diversity
            ]
        );
    }

    #[test]
    fn time_of_day_names_the_heaviest_bucket() {
        let records = vec![
            record("a", "2024-04-01T09:00:00+00:00", 30, DomainLabel::Generation),
            record("b", "2024-04-01T14:00:00+00:00", 90, DomainLabel::Generation),
        ];
        let config = AggregationConfig::default();
        let reporter = RecordingReporter::new();
        let first = insights(&records, &config, &reporter).next().unwrap();
        assert_eq!(first.kind, InsightKind::TimeOfDay);
        assert!(first.message.contains("during Afternoon hours"));
    }

    #[test]
    fn later_checks_are_not_evaluated_until_pulled() {
        let config = AggregationConfig::default();
        let reporter = RecordingReporter::new();
        let mut lazy = insights(&[], &config, &reporter);
        assert_eq!(reporter.count("check_skipped"), 0);

        lazy.next();
        assert_eq!(reporter.count("check_skipped"), 2);
        assert!(lazy.next().is_none());
        assert!(lazy.next().is_none());
    }

    #[test]
    fn balanced_diverse_period_without_generation_gives_default() {
        let records = vec![
            record("a", "2024-04-01T09:00:00+00:00", 60, DomainLabel::Charging),
            record("b", "2024-04-01T11:00:00+00:00", 60, DomainLabel::Growth),
            record("c", "2024-04-01T13:00:00+00:00", 60, DomainLabel::Vitality),
        ];
        let config = AggregationConfig::default();
        let reporter = RecordingReporter::new();
        let all = insights(&records, &config, &reporter).collect::<Vec<_>>();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].kind, InsightKind::Default);
    }
}
