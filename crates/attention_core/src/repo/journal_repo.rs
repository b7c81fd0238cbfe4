//! Journal entry facts, per-date sentiment and emotion distribution.
//!
//! # Invariants
//! - One row per source entry id; re-import replaces it.
//! - Only metadata and scores are stored; the journal body is not.

use crate::model::activity::JournalRecord;
use crate::model::domain::DomainLabel;
use crate::model::metrics::DailyEmotion;
use crate::repo::{parse_date, RepoError, RepoResult, DATE_FORMAT};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

pub trait JournalRepository {
    fn upsert_journal(&self, entry: &JournalRecord, domain: DomainLabel) -> RepoResult<()>;
    /// Mean polarity per entry date, over entries that carry sentiment.
    fn daily_sentiment(&self) -> RepoResult<BTreeMap<NaiveDate, f64>>;
    /// Primary emotion counts per entry date, ordered by date then emotion.
    /// Entries without an emotion still count toward the date's total.
    fn daily_emotions(&self) -> RepoResult<Vec<DailyEmotion>>;
    fn count_journal_entries(&self) -> RepoResult<usize>;
}

pub struct SqliteJournalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJournalRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl JournalRepository for SqliteJournalRepository<'_> {
    fn upsert_journal(&self, entry: &JournalRecord, domain: DomainLabel) -> RepoResult<()> {
        let record = &entry.record;
        let tags = record.tags().iter().cloned().collect::<Vec<_>>().join(",");
        let sentiment = entry.sentiment.as_ref();

        self.conn.execute(
            "INSERT INTO journal_entries (
                entry_id,
                created_at,
                entry_date,
                title,
                tags,
                location,
                domain,
                sentiment_polarity,
                sentiment_subjectivity,
                primary_emotion
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(entry_id) DO UPDATE SET
                created_at = excluded.created_at,
                entry_date = excluded.entry_date,
                title = excluded.title,
                tags = excluded.tags,
                location = excluded.location,
                domain = excluded.domain,
                sentiment_polarity = excluded.sentiment_polarity,
                sentiment_subjectivity = excluded.sentiment_subjectivity,
                primary_emotion = excluded.primary_emotion;",
            params![
                record.id(),
                record.start().to_rfc3339(),
                record.date().format(DATE_FORMAT).to_string(),
                record.title(),
                tags,
                entry.location.as_deref(),
                domain.as_str(),
                sentiment.map(|score| score.polarity),
                sentiment.map(|score| score.subjectivity),
                sentiment.and_then(|score| score.emotion.as_deref()),
            ],
        )?;

        Ok(())
    }

    fn daily_sentiment(&self) -> RepoResult<BTreeMap<NaiveDate, f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT entry_date, AVG(sentiment_polarity)
             FROM journal_entries
             WHERE sentiment_polarity IS NOT NULL
             GROUP BY entry_date
             ORDER BY entry_date ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut daily = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let date_text: String = row.get(0)?;
            let polarity: f64 = row.get(1)?;
            daily.insert(parse_date(&date_text, "journal_entries.entry_date")?, polarity);
        }
        Ok(daily)
    }

    fn daily_emotions(&self) -> RepoResult<Vec<DailyEmotion>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.entry_date, lower(trim(e.primary_emotion)) AS emotion, COUNT(*), t.day_entries
             FROM journal_entries e
             JOIN (
                 SELECT entry_date, COUNT(*) AS day_entries
                 FROM journal_entries
                 GROUP BY entry_date
             ) t ON t.entry_date = e.entry_date
             WHERE e.primary_emotion IS NOT NULL AND trim(e.primary_emotion) <> ''
             GROUP BY e.entry_date, emotion, t.day_entries
             ORDER BY e.entry_date ASC, emotion ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut emotions = Vec::new();
        while let Some(row) = rows.next()? {
            let date_text: String = row.get(0)?;
            let entries = count_column(row.get(2)?)?;
            let day_entries = count_column(row.get(3)?)?;
            emotions.push(DailyEmotion {
                date: parse_date(&date_text, "journal_entries.entry_date")?,
                emotion: row.get(1)?,
                entries,
                share: entries as f64 / day_entries as f64,
            });
        }
        Ok(emotions)
    }

    fn count_journal_entries(&self) -> RepoResult<usize> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM journal_entries;", [], |row| {
                row.get::<_, i64>(0)
            })?;
        count_column(count)
    }
}

fn count_column(count: i64) -> RepoResult<usize> {
    usize::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
}
