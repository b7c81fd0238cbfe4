//! Classified time entries and the activity dimension.
//!
//! # Responsibility
//! - Upsert classified records into `time_entries`, keyed by source id.
//! - Keep one `activities` row per domain and link entries to it.
//! - Read entries back as [`ClassifiedRecord`] values.
//!
//! # Invariants
//! - `start_time`/`end_time` are stored as RFC 3339 with the original offset,
//!   so the first ten characters are the record's local date.
//! - `duration` always equals the record's whole minutes.

use crate::model::activity::{ActivityRecord, ClassifiedRecord, RecordSource};
use crate::model::domain::DomainLabel;
use crate::repo::{parse_domain, RepoError, RepoResult, DATE_FORMAT};
use chrono::{DateTime, NaiveDate};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

const ENTRY_SELECT_SQL: &str = "SELECT
    e.source AS source,
    e.start_time AS start_time,
    e.end_time AS end_time,
    e.notes AS notes,
    e.source_kind AS source_kind,
    a.domain AS domain
FROM time_entries e
JOIN activities a ON a.activity_id = e.activity_id";

/// Filters for listing stored entries. Date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct TimeEntryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub source_kind: Option<RecordSource>,
}

impl TimeEntryQuery {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            source_kind: None,
        }
    }
}

pub trait TimeEntryRepository {
    /// Inserts or replaces the entry with the same source id.
    fn upsert_entry(&self, item: &ClassifiedRecord) -> RepoResult<()>;
    fn list_entries(&self, query: &TimeEntryQuery) -> RepoResult<Vec<ClassifiedRecord>>;
    fn count_entries(&self) -> RepoResult<usize>;
}

/// SQLite-backed time entry repository.
pub struct SqliteTimeEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTimeEntryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns the activity id for `domain`, creating the row on first use.
    pub fn ensure_activity(&self, domain: DomainLabel) -> RepoResult<i64> {
        self.conn.execute(
            "INSERT INTO activities (name, description, domain)
             VALUES (?1, ?2, ?1)
             ON CONFLICT(name) DO NOTHING;",
            params![domain.as_str(), format!("{domain} time")],
        )?;

        let id = self
            .conn
            .query_row(
                "SELECT activity_id FROM activities WHERE name = ?1;",
                [domain.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        id.ok_or_else(|| RepoError::InvalidData(format!("activity row missing for {domain}")))
    }
}

impl TimeEntryRepository for SqliteTimeEntryRepository<'_> {
    fn upsert_entry(&self, item: &ClassifiedRecord) -> RepoResult<()> {
        let activity_id = self.ensure_activity(item.domain)?;
        let record = &item.record;

        self.conn.execute(
            "INSERT INTO time_entries (
                activity_id,
                start_time,
                end_time,
                duration,
                notes,
                source,
                source_kind
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(source) DO UPDATE SET
                activity_id = excluded.activity_id,
                start_time = excluded.start_time,
                end_time = excluded.end_time,
                duration = excluded.duration,
                notes = excluded.notes,
                source_kind = excluded.source_kind;",
            params![
                activity_id,
                record.start().to_rfc3339(),
                record.end().to_rfc3339(),
                item.minutes().max(0),
                record.title(),
                record.id(),
                record.source().as_str(),
            ],
        )?;

        Ok(())
    }

    fn list_entries(&self, query: &TimeEntryQuery) -> RepoResult<Vec<ClassifiedRecord>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(from) = query.from {
            sql.push_str(" AND substr(e.start_time, 1, 10) >= ?");
            bind_values.push(Value::Text(from.format(DATE_FORMAT).to_string()));
        }
        if let Some(to) = query.to {
            sql.push_str(" AND substr(e.start_time, 1, 10) <= ?");
            bind_values.push(Value::Text(to.format(DATE_FORMAT).to_string()));
        }
        if let Some(kind) = query.source_kind {
            sql.push_str(" AND e.source_kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }
        sql.push_str(" ORDER BY e.start_time ASC, e.source ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }

    fn count_entries(&self) -> RepoResult<usize> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM time_entries;", [], |row| {
                row.get::<_, i64>(0)
            })?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<ClassifiedRecord> {
    let source: String = row.get("source")?;

    let start_text: String = row.get("start_time")?;
    let start = DateTime::parse_from_rfc3339(&start_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{start_text}` in time_entries.start_time"
        ))
    })?;
    let end_text: String = row.get("end_time")?;
    let end = DateTime::parse_from_rfc3339(&end_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{end_text}` in time_entries.end_time"
        ))
    })?;

    let kind_text: String = row.get("source_kind")?;
    let kind = RecordSource::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid source kind `{kind_text}` in time_entries.source_kind"
        ))
    })?;

    let domain_text: String = row.get("domain")?;
    let domain = parse_domain(&domain_text, "activities.domain")?;

    let title = row.get::<_, Option<String>>("notes")?.unwrap_or_default();
    let record = ActivityRecord::new(source, start, end, title, "", BTreeSet::new(), kind)
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;

    Ok(ClassifiedRecord::new(record, domain))
}
