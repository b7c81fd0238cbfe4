//! Calendar actions derived from where the period's time went.
//!
//! # Responsibility
//! - Suggest Charging breaks when Generation outweighs Charging.
//! - Name the hour that carries the most Generation time.
//! - Point at the first domain with no tracked time.
//!
//! # Invariants
//! - Rules run in fixed order: charging breaks, peak hour, domain gap.
//! - At least one action is always produced: any Generation time yields a
//!   peak hour, and no Generation time is a domain gap.

use crate::analysis::aggregate::{domain_totals, generation_minutes_by_hour};
use crate::model::activity::ClassifiedRecord;
use crate::model::advice::{ScheduleAction, ScheduleActionKind};
use crate::model::domain::DomainLabel;
use crate::report::Reporter;

const MODULE: &str = "schedule";

/// Generation may exceed Charging by at most this factor.
pub const MAX_GENERATION_TO_CHARGING_RATIO: i64 = 3;

pub const CHARGING_BREAK_ACTION: &str =
    "Schedule a dedicated 30-minute Charging activity after every 3 hours of Generation work.";

/// Builds the schedule actions for one period.
pub fn schedule_actions(
    records: &[ClassifiedRecord],
    reporter: &dyn Reporter,
) -> Vec<ScheduleAction> {
    let mut actions = Vec::new();
    actions.extend(charging_breaks(records));
    actions.extend(peak_hour(records));
    actions.extend(domain_gap(records));

    reporter.info(
        MODULE,
        "schedule_done",
        format!("status=ok records={} actions={}", records.len(), actions.len()),
    );
    actions
}

/// Fires when Generation minutes exceed the allowed multiple of Charging
/// minutes. No Charging time at all counts as an unbounded ratio.
fn charging_breaks(records: &[ClassifiedRecord]) -> Option<ScheduleAction> {
    let totals = domain_totals(records);
    let generation = totals.get(&DomainLabel::Generation).copied().unwrap_or(0);
    let charging = totals.get(&DomainLabel::Charging).copied().unwrap_or(0);

    (generation > 0 && generation > MAX_GENERATION_TO_CHARGING_RATIO * charging).then(|| {
        ScheduleAction::new(ScheduleActionKind::ChargingBreaks, CHARGING_BREAK_ACTION)
    })
}

/// Earliest hour wins a tie.
fn peak_hour(records: &[ClassifiedRecord]) -> Option<ScheduleAction> {
    let mut best: Option<(u32, i64)> = None;
    for (hour, minutes) in generation_minutes_by_hour(records) {
        if best.map_or(true, |(_, top)| minutes > top) {
            best = Some((hour, minutes));
        }
    }

    best.map(|(hour, _)| {
        ScheduleAction::new(
            ScheduleActionKind::PeakHour,
            format!(
                "Protect the {hour}:00-{}:00 hour as your 'peak performance time' for your most important Generation work.",
                hour + 1
            ),
        )
    })
}

fn domain_gap(records: &[ClassifiedRecord]) -> Option<ScheduleAction> {
    let totals = domain_totals(records);
    DomainLabel::MATCHABLE
        .into_iter()
        .find(|domain| totals.get(domain).copied().unwrap_or(0) == 0)
        .map(|domain| {
            ScheduleAction::new(
                ScheduleActionKind::DomainGap,
                format!("Add at least one {domain} activity to your schedule this week."),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::{schedule_actions, CHARGING_BREAK_ACTION};
    use crate::model::activity::{ActivityRecord, ClassifiedRecord, RecordSource};
    use crate::model::advice::ScheduleActionKind;
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

    fn kinds(records: &[ClassifiedRecord]) -> Vec<ScheduleActionKind> {
        schedule_actions(records, &RecordingReporter::new())
            .into_iter()
            .map(|action| action.kind)
            .collect()
    }

    fn every_domain(generation: i64, charging: i64) -> Vec<ClassifiedRecord> {
        vec![
            record("g", "2024-04-01T09:00:00+00:00", generation, DomainLabel::Generation),
            record("c", "2024-04-01T18:00:00+00:00", charging, DomainLabel::Charging),
            record("l", "2024-04-01T20:00:00+00:00", 30, DomainLabel::Growth),
            record("n", "2024-04-01T12:00:00+00:00", 30, DomainLabel::Connection),
            record("v", "2024-04-01T07:00:00+00:00", 30, DomainLabel::Vitality),
        ]
    }

    #[test]
    fn charging_breaks_need_ratio_above_three() {
        assert_eq!(
            kinds(&every_domain(180, 60)),
            vec![ScheduleActionKind::PeakHour]
        );
        assert_eq!(
            kinds(&every_domain(181, 60)),
            vec![ScheduleActionKind::ChargingBreaks, ScheduleActionKind::PeakHour]
        );
    }

    #[test]
    fn missing_charging_counts_as_unbounded_ratio() {
        let records = vec![record(
            "g",
            "2024-04-01T09:00:00+00:00",
            30,
            DomainLabel::Generation,
        )];
        let actions = schedule_actions(&records, &RecordingReporter::new());
        assert_eq!(actions[0].kind, ScheduleActionKind::ChargingBreaks);
        assert_eq!(actions[0].message, CHARGING_BREAK_ACTION);
    }

    #[test]
    fn peak_hour_prefers_most_minutes_then_earliest_hour() {
        let records = vec![
            record("a", "2024-04-01T08:30:00+00:00", 60, DomainLabel::Generation),
            record("b", "2024-04-02T14:10:00+00:00", 90, DomainLabel::Generation),
            record("c", "2024-04-03T08:05:00+00:00", 30, DomainLabel::Generation),
            record("d", "2024-04-03T06:00:00+00:00", 400, DomainLabel::Charging),
        ];
        let actions = schedule_actions(&records, &RecordingReporter::new());
        let peak = actions
            .iter()
            .find(|action| action.kind == ScheduleActionKind::PeakHour)
            .unwrap();
        assert!(peak.message.starts_with("Protect the 8:00-9:00 hour"));
    }

    #[test]
    fn gap_names_first_missing_domain_in_priority_order() {
        let records = vec![
            record("g", "2024-04-01T09:00:00+00:00", 60, DomainLabel::Generation),
            record("c", "2024-04-01T18:00:00+00:00", 60, DomainLabel::Charging),
            record("v", "2024-04-01T07:00:00+00:00", 30, DomainLabel::Vitality),
        ];
        let actions = schedule_actions(&records, &RecordingReporter::new());
        let gap = actions
            .iter()
            .find(|action| action.kind == ScheduleActionKind::DomainGap)
            .unwrap();
        assert_eq!(
            gap.message,
            "Add at least one Growth activity to your schedule this week."
        );
    }

    #[test]
    fn other_time_does_not_fill_a_gap() {
        let records = vec![record(
            "o",
            "2024-04-01T09:00:00+00:00",
            60,
            DomainLabel::Other,
        )];
        let actions = schedule_actions(&records, &RecordingReporter::new());
        assert_eq!(actions.len(), 1);
        assert_eq!(
            actions[0].message,
            "Add at least one Generation activity to your schedule this week."
        );
    }

    #[test]
    fn every_period_gets_at_least_one_action() {
        let reporter = RecordingReporter::new();
        let without_generation = every_domain(60, 60)
            .into_iter()
            .filter(|item| item.domain != DomainLabel::Generation)
            .collect::<Vec<_>>();
        assert_eq!(
            kinds(&without_generation),
            vec![ScheduleActionKind::DomainGap]
        );

        let actions = schedule_actions(&[], &reporter);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ScheduleActionKind::DomainGap);

        let actions = schedule_actions(&every_domain(60, 60), &reporter);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ScheduleActionKind::PeakHour);
        assert_eq!(reporter.count("schedule_done"), 2);
    }
}
