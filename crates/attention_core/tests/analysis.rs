use attention_core::analysis::aggregate::{daily_allocation, daily_minutes_table, rolling_allocation};
use attention_core::analysis::categorize::classify_all;
use attention_core::analysis::correlate::correlate;
use attention_core::analysis::recommend::generate_recommendations;
use attention_core::config::CorrelationConfig;
use attention_core::{
    categorize, Action, ActivityRecord, CorrelationReport, CorrelationResult, DomainLabel,
    DomainShare, KeywordConfig, OutcomeKind, OutcomeMetric, Priority, RecordSource,
    RecordingReporter,
};
use chrono::{DateTime, Duration, NaiveDate};
use std::collections::BTreeSet;

fn record(id: &str, title: &str, start: &str, minutes: i64) -> ActivityRecord {
    let start = DateTime::parse_from_rfc3339(start).unwrap();
    ActivityRecord::new(
        id,
        start,
        start + Duration::minutes(minutes),
        title,
        "",
        BTreeSet::new(),
        RecordSource::Calendar,
    )
    .unwrap()
}

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

fn outcome(day: &str, happiness: u8, peace: u8) -> OutcomeMetric {
    let mut metric = OutcomeMetric::new(date(day));
    metric.happiness = Some(happiness);
    metric.peace = Some(peace);
    metric
}

#[test]
fn default_keywords_cover_common_titles() {
    let keywords = KeywordConfig::default();
    let no_tags: [&str; 0] = [];
    assert_eq!(
        categorize(&keywords, "Write blog post", "", &no_tags),
        DomainLabel::Generation
    );
    assert_eq!(
        categorize(&keywords, "Coffee with Sam", "", &no_tags),
        DomainLabel::Connection
    );
    assert_eq!(
        categorize(&keywords, "Dentist", "", &no_tags),
        DomainLabel::Vitality
    );
    assert_eq!(
        categorize(&keywords, "Untitled", "", &no_tags),
        DomainLabel::Other
    );
}

#[test]
fn daily_percentages_sum_to_one_hundred() {
    let keywords = KeywordConfig::default();
    let classified = classify_all(
        &keywords,
        vec![
            record("a", "Write chapter", "2024-05-01T09:00:00+02:00", 95),
            record("b", "Lunch with team", "2024-05-01T12:00:00+02:00", 40),
            record("c", "Nap", "2024-05-01T15:00:00+02:00", 25),
            record("d", "Online course", "2024-05-02T19:00:00+02:00", 50),
        ],
    );
    let rows = daily_allocation(&classified);

    for day in ["2024-05-01", "2024-05-02"] {
        let sum: f64 = rows
            .iter()
            .filter(|row| row.date == date(day))
            .map(|row| row.percentage_of_day)
            .sum();
        assert!((sum - 100.0).abs() < 1e-9, "{day} sums to {sum}");
    }
    assert_eq!(rows.len(), 4);
}

/// Growth on every day; Connection on the first three days only.
fn sparse_week() -> (Vec<ActivityRecord>, Vec<OutcomeMetric>) {
    let mut records = Vec::new();
    let mut outcomes = Vec::new();
    for (offset, (growth, happiness)) in [(20, 4), (40, 5), (60, 6), (80, 7), (100, 8), (120, 9)]
        .into_iter()
        .enumerate()
    {
        let day = format!("2024-05-{:02}", offset + 1);
        records.push(record(
            &format!("g{offset}"),
            "Study session",
            &format!("{day}T10:00:00Z"),
            growth,
        ));
        if offset < 3 {
            records.push(record(
                &format!("c{offset}"),
                "Dinner party",
                &format!("{day}T19:00:00Z"),
                60 + offset as i64 * 30,
            ));
        }
        outcomes.push(outcome(&day, happiness, 10 - happiness));
    }
    (records, outcomes)
}

#[test]
fn sparse_domains_count_zero_minutes_on_tracked_days() {
    let keywords = KeywordConfig::default();
    let (records, outcomes) = sparse_week();

    let classified = classify_all(&keywords, records);
    let table = daily_minutes_table(&daily_allocation(&classified));
    let reporter = RecordingReporter::new();
    let report = correlate(&table, &outcomes, &CorrelationConfig::default(), &reporter);

    // Connection minutes 60, 90, 120, 0, 0, 0 against happiness 4..=9.
    let connection = report
        .matrix
        .iter()
        .find(|result| {
            result.domain == DomainLabel::Connection && result.metric == OutcomeKind::Happiness
        })
        .unwrap();
    assert_eq!(connection.samples, 6);
    assert_eq!(connection.coefficient, -0.7);
    assert_eq!(report.matrix.len(), 4);
    // Freedom and well-being were never scored.
    assert_eq!(reporter.count("pair_skipped"), 4);

    let positive = report
        .positive
        .iter()
        .map(|result| (result.domain, result.metric))
        .collect::<Vec<_>>();
    assert_eq!(
        positive,
        vec![
            (DomainLabel::Growth, OutcomeKind::Happiness),
            (DomainLabel::Connection, OutcomeKind::Peace)
        ]
    );
    let negative = report
        .negative
        .iter()
        .map(|result| (result.domain, result.metric))
        .collect::<Vec<_>>();
    assert_eq!(
        negative,
        vec![
            (DomainLabel::Growth, OutcomeKind::Peace),
            (DomainLabel::Connection, OutcomeKind::Happiness)
        ]
    );

    // Both domains have a positive pair, so each gets one recommendation.
    let shares = rolling_allocation(&classified, date("2024-05-06"), 30);
    let recommendations = generate_recommendations(&report, &shares);
    let summary = recommendations
        .iter()
        .map(|rec| (rec.domain, rec.action, rec.priority))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            (DomainLabel::Connection, Action::Optimize, Priority::Low),
            (DomainLabel::Growth, Action::Optimize, Priority::Low)
        ]
    );
}

#[test]
fn analysis_is_repeatable() {
    let keywords = KeywordConfig::default();
    let (records, outcomes) = sparse_week();
    let config = CorrelationConfig::default();

    let run = || {
        let classified = classify_all(&keywords, records.clone());
        let allocation = daily_allocation(&classified);
        let report = correlate(
            &daily_minutes_table(&allocation),
            &outcomes,
            &config,
            &RecordingReporter::new(),
        );
        let shares = rolling_allocation(&classified, date("2024-05-06"), 30);
        let recommendations = generate_recommendations(&report, &shares);
        (allocation, report, shares, recommendations)
    };

    let first = run();
    let second = run();
    assert!(!first.1.is_empty());
    assert_eq!(first, second);
}

fn single_pair_report(coefficient: f64) -> CorrelationReport {
    let result = CorrelationResult {
        domain: DomainLabel::Growth,
        metric: OutcomeKind::Happiness,
        coefficient,
        samples: 6,
    };
    let mut report = CorrelationReport {
        matrix: vec![result.clone()],
        ..CorrelationReport::default()
    };
    if coefficient > 0.0 {
        report.positive.push(result);
    } else {
        report.negative.push(result);
    }
    report
}

#[test]
fn recommendation_bands_hold_across_current_shares() {
    const SHARES: [f64; 8] = [0.0, 4.99, 5.0, 9.99, 10.0, 24.99, 25.0, 100.0];
    let positive = single_pair_report(0.8);
    let negative = single_pair_report(-0.8);

    for current in SHARES {
        let shares = [DomainShare {
            domain: DomainLabel::Growth,
            minutes: 60,
            percentage: current,
        }];

        let up = generate_recommendations(&positive, &shares);
        assert_eq!(up.len(), 1, "positive at {current}");
        let rec = &up[0];
        assert!((0.0..=100.0).contains(&rec.suggested_percentage));
        let expected = if current < 5.0 {
            (Action::Increase, Priority::High)
        } else if current < 10.0 {
            (Action::Increase, Priority::Medium)
        } else if current < 25.0 {
            (Action::Maintain, Priority::Medium)
        } else {
            (Action::Optimize, Priority::Low)
        };
        assert_eq!((rec.action, rec.priority), expected, "positive at {current}");
        if rec.action == Action::Increase {
            assert!(rec.suggested_percentage >= rec.current_percentage);
        }

        let down = generate_recommendations(&negative, &shares);
        let expected = if current > 30.0 {
            Some((Action::Decrease, Priority::High))
        } else if current > 20.0 {
            Some((Action::Decrease, Priority::Medium))
        } else if current > 5.0 {
            Some((Action::Review, Priority::Medium))
        } else {
            None
        };
        assert_eq!(
            down.first().map(|rec| (rec.action, rec.priority)),
            expected,
            "negative at {current}"
        );
        for rec in &down {
            assert!((0.0..=100.0).contains(&rec.suggested_percentage));
            assert!(rec.suggested_percentage <= rec.current_percentage);
        }
    }
}
