//! Daily outcome metrics persistence.
//!
//! # Invariants
//! - Writes call `OutcomeMetric::validate()` before touching SQL.
//! - An upsert never clears a stored score: absent fields keep their value.

use crate::model::outcome::{OutcomeKind, OutcomeMetric, MAX_SCORE, MIN_SCORE};
use crate::repo::{parse_date, RepoError, RepoResult, DATE_FORMAT};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const OUTCOME_SELECT_SQL: &str = "SELECT
    date,
    happiness,
    peace,
    freedom,
    well_being
FROM outcome_metrics";

pub trait OutcomeRepository {
    /// Merges the present scores of `metric` into the row for its date.
    fn upsert(&self, metric: &OutcomeMetric) -> RepoResult<()>;
    /// Sets only the happiness score for `date`, creating the row if needed.
    fn apply_happiness(&self, date: NaiveDate, happiness: u8) -> RepoResult<()>;
    fn get(&self, date: NaiveDate) -> RepoResult<Option<OutcomeMetric>>;
    /// All rows in date order.
    fn list(&self) -> RepoResult<Vec<OutcomeMetric>>;
}

pub struct SqliteOutcomeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOutcomeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OutcomeRepository for SqliteOutcomeRepository<'_> {
    fn upsert(&self, metric: &OutcomeMetric) -> RepoResult<()> {
        metric.validate()?;

        self.conn.execute(
            "INSERT INTO outcome_metrics (date, happiness, peace, freedom, well_being)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(date) DO UPDATE SET
                happiness = COALESCE(excluded.happiness, happiness),
                peace = COALESCE(excluded.peace, peace),
                freedom = COALESCE(excluded.freedom, freedom),
                well_being = COALESCE(excluded.well_being, well_being);",
            params![
                metric.date.format(DATE_FORMAT).to_string(),
                metric.happiness,
                metric.peace,
                metric.freedom,
                metric.well_being,
            ],
        )?;

        Ok(())
    }

    fn apply_happiness(&self, date: NaiveDate, happiness: u8) -> RepoResult<()> {
        let mut metric = OutcomeMetric::new(date);
        metric.happiness = Some(happiness);
        self.upsert(&metric)
    }

    fn get(&self, date: NaiveDate) -> RepoResult<Option<OutcomeMetric>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{OUTCOME_SELECT_SQL} WHERE date = ?1;"))?;
        let mut rows = stmt.query([date.format(DATE_FORMAT).to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_outcome_row(row)?));
        }
        Ok(None)
    }

    fn list(&self) -> RepoResult<Vec<OutcomeMetric>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{OUTCOME_SELECT_SQL} ORDER BY date ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut metrics = Vec::new();
        while let Some(row) = rows.next()? {
            metrics.push(parse_outcome_row(row)?);
        }
        Ok(metrics)
    }
}

fn parse_outcome_row(row: &Row<'_>) -> RepoResult<OutcomeMetric> {
    let date_text: String = row.get("date")?;
    let mut metric = OutcomeMetric::new(parse_date(&date_text, "outcome_metrics.date")?);

    for kind in OutcomeKind::ALL {
        let score = match row.get::<_, Option<i64>>(kind.as_str())? {
            Some(value) => Some(score_from_db(value, kind)?),
            None => None,
        };
        match kind {
            OutcomeKind::Happiness => metric.happiness = score,
            OutcomeKind::Peace => metric.peace = score,
            OutcomeKind::Freedom => metric.freedom = score,
            OutcomeKind::WellBeing => metric.well_being = score,
        }
    }

    Ok(metric)
}

fn score_from_db(value: i64, kind: OutcomeKind) -> RepoResult<u8> {
    u8::try_from(value)
        .ok()
        .filter(|score| (MIN_SCORE..=MAX_SCORE).contains(score))
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid score `{value}` in outcome_metrics.{}",
                kind.as_str()
            ))
        })
}
