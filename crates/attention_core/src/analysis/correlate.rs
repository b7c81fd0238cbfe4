//! Domain-time vs outcome correlation.
//!
//! # Responsibility
//! - Join the daily minutes table with outcome rows on date. A domain with
//!   no time on a tracked date counts as 0 minutes for that date.
//! - Compute Pearson coefficients per `(domain, metric)` pair and split them
//!   into positive/negative summary lists.
//!
//! # Invariants
//! - Only tracked dates (dates with any categorized time) are sampled.
//! - Pairs with fewer than `min_samples` paired dates are never computed.
//! - Undefined coefficients (zero variance) are dropped, not reported as 0.
//! - Coefficients are rounded to two decimals and lie within `[-1, 1]`.
//! - Output order is fully determined by the input values.

use crate::analysis::aggregate::DailyMinutesTable;
use crate::config::CorrelationConfig;
use crate::model::metrics::{CorrelationReport, CorrelationResult};
use crate::model::outcome::{OutcomeKind, OutcomeMetric};
use crate::report::Reporter;
use chrono::NaiveDate;
use std::collections::BTreeMap;

const MODULE: &str = "correlate";

/// Correlates each domain's daily minutes with each outcome metric.
pub fn correlate(
    table: &DailyMinutesTable,
    outcomes: &[OutcomeMetric],
    config: &CorrelationConfig,
    reporter: &dyn Reporter,
) -> CorrelationReport {
    let outcomes_by_date = outcomes
        .iter()
        .map(|metric| (metric.date, metric))
        .collect::<BTreeMap<NaiveDate, &OutcomeMetric>>();

    let mut matrix = Vec::new();
    for domain in table.domains() {
        for metric in OutcomeKind::ALL {
            let (xs, ys): (Vec<f64>, Vec<f64>) = table
                .dates()
                .filter_map(|date| {
                    let minutes = table.minutes(date, domain).unwrap_or(0);
                    let score = outcomes_by_date.get(&date)?.value(metric)?;
                    Some((minutes as f64, f64::from(score)))
                })
                .unzip();

            if xs.len() < config.min_samples {
                reporter.debug(
                    MODULE,
                    "pair_skipped",
                    format!(
                        "status=skip reason=insufficient_sample domain={domain} metric={metric} samples={} min_samples={}",
                        xs.len(),
                        config.min_samples
                    ),
                );
                continue;
            }

            let Some(coefficient) = pearson(&xs, &ys) else {
                reporter.debug(
                    MODULE,
                    "pair_skipped",
                    format!(
                        "status=skip reason=undefined domain={domain} metric={metric} samples={}",
                        xs.len()
                    ),
                );
                continue;
            };

            matrix.push(CorrelationResult {
                domain,
                metric,
                coefficient: round_two(coefficient),
                samples: xs.len(),
            });
        }
    }

    let mut positive = matrix
        .iter()
        .filter(|result| result.coefficient > config.threshold)
        .cloned()
        .collect::<Vec<_>>();
    positive.sort_by(|a, b| b.coefficient.total_cmp(&a.coefficient));

    let mut negative = matrix
        .iter()
        .filter(|result| result.coefficient < -config.threshold)
        .cloned()
        .collect::<Vec<_>>();
    negative.sort_by(|a, b| a.coefficient.total_cmp(&b.coefficient));

    reporter.info(
        MODULE,
        "correlation_done",
        format!(
            "status=ok pairs={} positive={} negative={}",
            matrix.len(),
            positive.len(),
            negative.len()
        ),
    );

    CorrelationReport {
        matrix,
        positive,
        negative,
    }
}

/// Pearson product-moment coefficient.
///
/// Returns `None` for mismatched or too-short input and when either series
/// has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    let r = sxy / (sxx * syy).sqrt();
    if !r.is_finite() {
        return None;
    }
    Some(r.clamp(-1.0, 1.0))
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
