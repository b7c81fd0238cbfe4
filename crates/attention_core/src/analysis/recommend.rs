//! Correlation-driven allocation recommendations.
//!
//! # Responsibility
//! - Turn positive/negative correlation lists plus current allocation into
//!   prioritized recommendations.
//!
//! # Invariants
//! - A domain in both lists gets only its positive recommendation.
//! - Output is sorted by priority, then by domain name.
//! - Percentages are rounded to one decimal and clamped to `0..=100`;
//!   thresholds are applied to the unrounded current share.

use crate::model::advice::{Action, Priority, Recommendation};
use crate::model::domain::DomainLabel;
use crate::model::metrics::{CorrelationReport, CorrelationResult, DomainShare};
use crate::model::outcome::OutcomeKind;
use std::collections::BTreeMap;

/// Builds the recommendation list for one run.
///
/// `current` is the rolling-window allocation; a domain missing from it is
/// treated as 0%.
pub fn generate_recommendations(
    report: &CorrelationReport,
    current: &[DomainShare],
) -> Vec<Recommendation> {
    let current_by_domain = current
        .iter()
        .map(|share| (share.domain, share.percentage))
        .collect::<BTreeMap<_, _>>();
    let current_of = |domain: DomainLabel| current_by_domain.get(&domain).copied().unwrap_or(0.0);

    let positive = metrics_by_domain(&report.positive);
    let negative = metrics_by_domain(&report.negative);

    let mut recommendations = Vec::new();

    for (domain, metrics) in &positive {
        recommendations.push(recommend_positive(*domain, current_of(*domain), metrics));
    }

    for (domain, metrics) in &negative {
        if positive.contains_key(domain) {
            continue;
        }
        if let Some(recommendation) = recommend_negative(*domain, current_of(*domain), metrics) {
            recommendations.push(recommendation);
        }
    }

    recommendations.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.domain.as_str().cmp(b.domain.as_str()))
    });
    recommendations
}

fn recommend_positive(domain: DomainLabel, current: f64, metrics: &[OutcomeKind]) -> Recommendation {
    let metrics_text = join_metrics(metrics);
    let (action, reason, suggested, priority) = if current < 10.0 {
        let priority = if current < 5.0 {
            Priority::High
        } else {
            Priority::Medium
        };
        (
            Action::Increase,
            format!("Strongly correlates with {metrics_text}"),
            (current * 1.5).min(current + 15.0),
            priority,
        )
    } else if current < 25.0 {
        (
            Action::Maintain,
            format!("Positively impacts {metrics_text}"),
            current,
            Priority::Medium,
        )
    } else {
        (
            Action::Optimize,
            format!("Important for {metrics_text}, but ensure quality over quantity"),
            current,
            Priority::Low,
        )
    };

    build(domain, action, reason, current, suggested, priority)
}

fn recommend_negative(
    domain: DomainLabel,
    current: f64,
    metrics: &[OutcomeKind],
) -> Option<Recommendation> {
    let metrics_text = join_metrics(metrics);
    if current > 20.0 {
        let priority = if current > 30.0 {
            Priority::High
        } else {
            Priority::Medium
        };
        Some(build(
            domain,
            Action::Decrease,
            format!("Negatively correlates with {metrics_text}"),
            current,
            (current * 0.7).max(current - 15.0),
            priority,
        ))
    } else if current > 5.0 {
        Some(build(
            domain,
            Action::Review,
            format!("May negatively impact {metrics_text}"),
            current,
            current * 0.9,
            Priority::Medium,
        ))
    } else {
        None
    }
}

fn build(
    domain: DomainLabel,
    action: Action,
    reason: String,
    current: f64,
    suggested: f64,
    priority: Priority,
) -> Recommendation {
    Recommendation {
        domain,
        action,
        reason,
        current_percentage: round_percentage(current),
        suggested_percentage: round_percentage(suggested),
        priority,
    }
}

/// Groups correlated metrics per domain, keeping list order and dropping
/// repeats.
fn metrics_by_domain(results: &[CorrelationResult]) -> BTreeMap<DomainLabel, Vec<OutcomeKind>> {
    let mut grouped = BTreeMap::<DomainLabel, Vec<OutcomeKind>>::new();
    for result in results {
        let metrics = grouped.entry(result.domain).or_default();
        if !metrics.contains(&result.metric) {
            metrics.push(result.metric);
        }
    }
    grouped
}

fn join_metrics(metrics: &[OutcomeKind]) -> String {
    metrics
        .iter()
        .map(|metric| metric.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn round_percentage(value: f64) -> f64 {
    ((value * 10.0).round() / 10.0).clamp(0.0, 100.0)
}
