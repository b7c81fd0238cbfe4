//! End-to-end analysis run.
//!
//! # Responsibility
//! - Pull raw records from the collaborators, normalize, classify and store
//!   them.
//! - Recompute daily allocations, happiness and emotion distribution,
//!   correlate, recommend, and derive insights and schedule actions.
//! - Account for every step in the run result.
//!
//! # Invariants
//! - Steps run in fixed order: `calendar_import`, `journal_import` (only with
//!   a journal source), `daily_metrics`, `pattern_analysis`,
//!   `recommendations`, `insights`.
//! - A step fails only on collaborator or store errors; a failed step never
//!   aborts the run. `recommendations` is skipped when `pattern_analysis`
//!   failed, since it has no correlations to work from.
//! - Each store interaction opens and releases its own connection.
//! - Timed records from every source are dated in one time zone: the fixed
//!   `utc_offset` when given, the process's local zone otherwise.

use crate::analysis::aggregate::{daily_allocation, daily_minutes_table, rolling_allocation};
use crate::analysis::categorize::{categorize, classify_all};
use crate::analysis::correlate::correlate;
use crate::analysis::insight::Insights;
use crate::analysis::recommend::generate_recommendations;
use crate::analysis::schedule::schedule_actions;
use crate::config::EngineConfig;
use crate::db::{with_store, DbError};
use crate::ingest::dayone::DayOneExportSource;
use crate::ingest::normalize::{
    normalize_calendar_events, normalize_calendar_events_in, normalize_journal_entries,
    normalize_journal_entries_in,
};
use crate::ingest::source::{
    CalendarQuery, CalendarSource, JournalSource, SourceError, DEFAULT_CALENDAR_ID,
    DEFAULT_DAYS_BACK, DEFAULT_DAYS_FORWARD,
};
use crate::model::advice::{Insight, Recommendation, ScheduleAction};
use crate::model::metrics::{CorrelationReport, DailyEmotion, DomainShare};
use crate::repo::allocation_repo::{AllocationRepository, SqliteAllocationRepository};
use crate::repo::journal_repo::{JournalRepository, SqliteJournalRepository};
use crate::repo::outcome_repo::{OutcomeRepository, SqliteOutcomeRepository};
use crate::repo::time_entry_repo::{
    SqliteTimeEntryRepository, TimeEntryQuery, TimeEntryRepository,
};
use crate::repo::RepoError;
use crate::report::Reporter;
use chrono::{Days, FixedOffset, Local, NaiveDate, Utc};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

const MODULE: &str = "pipeline";

/// Caller-supplied knobs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub calendar_days_back: u32,
    pub calendar_days_forward: u32,
    pub calendar_id: String,
    /// Day One export file or directory; ignored when a journal source was
    /// attached to the pipeline.
    pub journal_path: Option<PathBuf>,
    /// Reference date; today when `None`.
    pub as_of: Option<NaiveDate>,
    /// Zone records are dated in; the process's local zone when `None`.
    pub utc_offset: Option<FixedOffset>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            calendar_days_back: DEFAULT_DAYS_BACK,
            calendar_days_forward: DEFAULT_DAYS_FORWARD,
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            journal_path: None,
            as_of: None,
            utc_offset: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    CalendarImport,
    JournalImport,
    DailyMetrics,
    PatternAnalysis,
    Recommendations,
    Insights,
}

impl StepName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CalendarImport => "calendar_import",
            Self::JournalImport => "journal_import",
            Self::DailyMetrics => "daily_metrics",
            Self::PatternAnalysis => "pattern_analysis",
            Self::Recommendations => "recommendations",
            Self::Insights => "insights",
        }
    }

    fn is_import(self) -> bool {
        matches!(self, Self::CalendarImport | Self::JournalImport)
    }
}

impl Display for StepName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a step failed.
#[derive(Debug)]
pub enum StepError {
    Source(SourceError),
    Repo(RepoError),
    Db(DbError),
}

impl Display for StepError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<SourceError> for StepError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<RepoError> for StepError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for StepError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StepError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub step: StepName,
    pub error: String,
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineRunResult {
    pub run_id: Uuid,
    pub as_of: NaiveDate,
    /// No step failed and at least one import step completed.
    pub success: bool,
    pub steps_completed: Vec<StepName>,
    pub steps_failed: Vec<StepFailure>,
    /// Steps not attempted because a step they depend on failed.
    pub steps_skipped: Vec<StepName>,
    pub recommendations: Vec<Recommendation>,
    pub insights: Vec<Insight>,
    /// Calendar changes for the insight period.
    pub schedule_actions: Vec<ScheduleAction>,
    pub correlations: CorrelationReport,
    /// Rolling-window allocation the recommendations were based on.
    pub current_allocation: Vec<DomainShare>,
    /// Primary emotion distribution per journal date.
    pub daily_emotions: Vec<DailyEmotion>,
    /// Raw records dropped by the normalizer across both imports.
    pub dropped_records: usize,
}

impl PipelineRunResult {
    fn new(as_of: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            as_of,
            success: false,
            steps_completed: Vec::new(),
            steps_failed: Vec::new(),
            steps_skipped: Vec::new(),
            recommendations: Vec::new(),
            insights: Vec::new(),
            schedule_actions: Vec::new(),
            correlations: CorrelationReport::default(),
            current_allocation: Vec::new(),
            daily_emotions: Vec::new(),
            dropped_records: 0,
        }
    }

    pub fn completed(&self, step: StepName) -> bool {
        self.steps_completed.contains(&step)
    }

    pub fn failed(&self, step: StepName) -> bool {
        self.steps_failed.iter().any(|failure| failure.step == step)
    }
}

/// Orchestrates one analysis run against a store file.
pub struct AttentionPipeline<'a> {
    db_path: PathBuf,
    config: EngineConfig,
    calendar: &'a dyn CalendarSource,
    journal: Option<&'a dyn JournalSource>,
    reporter: &'a dyn Reporter,
}

impl<'a> AttentionPipeline<'a> {
    pub fn new(
        db_path: impl Into<PathBuf>,
        config: EngineConfig,
        calendar: &'a dyn CalendarSource,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            db_path: db_path.into(),
            config,
            calendar,
            journal: None,
            reporter,
        }
    }

    /// Attaches a journal source, enabling the `journal_import` step.
    pub fn with_journal(mut self, journal: &'a dyn JournalSource) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every step and reports the outcome of each.
    pub fn run(&self, options: &RunOptions) -> PipelineRunResult {
        let as_of = options.as_of.unwrap_or_else(|| match options.utc_offset {
            Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
            None => Local::now().date_naive(),
        });
        let mut result = PipelineRunResult::new(as_of);
        let started_at = Instant::now();
        self.reporter.info(
            MODULE,
            "pipeline_run",
            format!("status=start run_id={} as_of={as_of}", result.run_id),
        );

        let query = CalendarQuery::around(
            as_of,
            options.calendar_id.as_str(),
            options.calendar_days_back,
            options.calendar_days_forward,
        );
        if let Some(dropped) =
            self.step(&mut result, StepName::CalendarImport, || {
                self.import_calendar(&query, options.utc_offset)
            })
        {
            result.dropped_records += dropped;
        }

        let path_journal = options
            .journal_path
            .as_ref()
            .map(|path| DayOneExportSource::new(path.clone()));
        let journal: Option<&dyn JournalSource> = match (self.journal, path_journal.as_ref()) {
            (Some(journal), _) => Some(journal),
            (None, Some(source)) => Some(source),
            (None, None) => None,
        };
        if let Some(journal) = journal {
            if let Some(dropped) =
                self.step(&mut result, StepName::JournalImport, || {
                self.import_journal(journal, options.utc_offset)
            })
            {
                result.dropped_records += dropped;
            }
        }

        let emotions = self.step(&mut result, StepName::DailyMetrics, || self.daily_metrics());
        if let Some(emotions) = emotions {
            result.daily_emotions = emotions;
        }

        let correlations = self.step(&mut result, StepName::PatternAnalysis, || {
            self.pattern_analysis()
        });

        match correlations {
            Some(report) => {
                if let Some((shares, recommendations)) =
                    self.step(&mut result, StepName::Recommendations, || {
                        self.recommendations(&report, as_of)
                    })
                {
                    result.current_allocation = shares;
                    result.recommendations = recommendations;
                }
                result.correlations = report;
            }
            None => {
                self.reporter.warn(
                    MODULE,
                    "pipeline_step",
                    format!(
                        "status=skip run_id={} step={} reason=dependency_failed",
                        result.run_id,
                        StepName::Recommendations
                    ),
                );
                result.steps_skipped.push(StepName::Recommendations);
            }
        }

        if let Some((insights, actions)) = self.step(&mut result, StepName::Insights, || {
            self.insights(as_of, options.calendar_days_back)
        }) {
            result.insights = insights;
            result.schedule_actions = actions;
        }

        result.success = result.steps_failed.is_empty()
            && result.steps_completed.iter().any(|step| step.is_import());

        self.reporter.info(
            MODULE,
            "pipeline_run",
            format!(
                "status={} run_id={} duration_ms={} completed={} failed={} skipped={} dropped={} recommendations={} insights={}",
                if result.success { "ok" } else { "error" },
                result.run_id,
                started_at.elapsed().as_millis(),
                result.steps_completed.len(),
                result.steps_failed.len(),
                result.steps_skipped.len(),
                result.dropped_records,
                result.recommendations.len(),
                result.insights.len()
            ),
        );
        result
    }

    fn step<T>(
        &self,
        result: &mut PipelineRunResult,
        name: StepName,
        f: impl FnOnce() -> Result<T, StepError>,
    ) -> Option<T> {
        let started_at = Instant::now();
        match f() {
            Ok(value) => {
                self.reporter.info(
                    MODULE,
                    "pipeline_step",
                    format!(
                        "status=ok run_id={} step={name} duration_ms={}",
                        result.run_id,
                        started_at.elapsed().as_millis()
                    ),
                );
                result.steps_completed.push(name);
                Some(value)
            }
            Err(err) => {
                self.reporter.error(
                    MODULE,
                    "pipeline_step",
                    format!(
                        "status=error run_id={} step={name} duration_ms={} error={err}",
                        result.run_id,
                        started_at.elapsed().as_millis()
                    ),
                );
                result.steps_failed.push(StepFailure {
                    step: name,
                    error: err.to_string(),
                });
                None
            }
        }
    }

    /// Returns the number of dropped raw events.
    fn import_calendar(
        &self,
        query: &CalendarQuery,
        offset: Option<FixedOffset>,
    ) -> Result<usize, StepError> {
        let events = self.calendar.fetch_events(query)?;
        let batch = match offset {
            Some(offset) => normalize_calendar_events_in(&events, &offset, self.reporter),
            None => normalize_calendar_events(&events, self.reporter),
        };
        let classified = classify_all(&self.config.keywords, batch.records);

        with_store(&self.db_path, |conn| -> Result<(), StepError> {
            let tx = conn.transaction()?;
            {
                let repo = SqliteTimeEntryRepository::new(&tx);
                for item in &classified {
                    repo.upsert_entry(item)?;
                }
            }
            tx.commit()?;
            Ok(())
        })?;

        self.reporter.info(
            MODULE,
            "calendar_import",
            format!(
                "status=ok fetched={} stored={} dropped={}",
                events.len(),
                classified.len(),
                batch.dropped
            ),
        );
        Ok(batch.dropped)
    }

    /// Returns the number of dropped raw entries.
    fn import_journal(
        &self,
        journal: &dyn JournalSource,
        offset: Option<FixedOffset>,
    ) -> Result<usize, StepError> {
        let entries = journal.load_entries()?;
        let batch = match offset {
            Some(offset) => normalize_journal_entries_in(&entries, &offset, self.reporter),
            None => normalize_journal_entries(&entries, self.reporter),
        };

        with_store(&self.db_path, |conn| -> Result<(), StepError> {
            let tx = conn.transaction()?;
            {
                let repo = SqliteJournalRepository::new(&tx);
                for entry in &batch.records {
                    let record = &entry.record;
                    let tags = record.tags().iter().collect::<Vec<_>>();
                    let domain = categorize(
                        &self.config.keywords,
                        record.title(),
                        record.description(),
                        &tags,
                    );
                    repo.upsert_journal(entry, domain)?;
                }
            }
            tx.commit()?;
            Ok(())
        })?;

        self.reporter.info(
            MODULE,
            "journal_import",
            format!(
                "status=ok loaded={} stored={} dropped={}",
                entries.len(),
                batch.records.len(),
                batch.dropped
            ),
        );
        Ok(batch.dropped)
    }

    fn daily_metrics(&self) -> Result<Vec<DailyEmotion>, StepError> {
        let happiness = &self.config.happiness;
        let (rows, applied, emotions) = with_store(&self.db_path, |conn| -> Result<_, StepError> {
            let tx = conn.transaction()?;
            let counts = {
                let records =
                    SqliteTimeEntryRepository::new(&tx).list_entries(&TimeEntryQuery::default())?;
                let allocations = daily_allocation(&records);
                SqliteAllocationRepository::new(&tx).replace_daily_allocations(&allocations)?;

                let outcomes = SqliteOutcomeRepository::new(&tx);
                let journal = SqliteJournalRepository::new(&tx);
                let mut applied = 0usize;
                for (date, polarity) in journal.daily_sentiment()? {
                    if let Some(score) = happiness.happiness_from_polarity(polarity) {
                        outcomes.apply_happiness(date, score)?;
                        applied += 1;
                    }
                }
                (allocations.len(), applied, journal.daily_emotions()?)
            };
            tx.commit()?;
            Ok(counts)
        })?;

        self.reporter.info(
            MODULE,
            "daily_metrics",
            format!(
                "status=ok allocation_rows={rows} happiness_days={applied} emotion_rows={}",
                emotions.len()
            ),
        );
        Ok(emotions)
    }

    fn pattern_analysis(&self) -> Result<CorrelationReport, StepError> {
        let (allocations, outcomes) = with_store(&self.db_path, |conn| -> Result<_, StepError> {
            let allocations = SqliteAllocationRepository::new(conn).list_daily_allocations()?;
            let outcomes = SqliteOutcomeRepository::new(conn).list()?;
            Ok((allocations, outcomes))
        })?;

        let table = daily_minutes_table(&allocations);
        Ok(correlate(
            &table,
            &outcomes,
            &self.config.correlation,
            self.reporter,
        ))
    }

    fn recommendations(
        &self,
        report: &CorrelationReport,
        as_of: NaiveDate,
    ) -> Result<(Vec<DomainShare>, Vec<Recommendation>), StepError> {
        let window_days = self.config.aggregation.rolling_window_days;
        let query = TimeEntryQuery::between(days_before(as_of, window_days), as_of);
        let records = with_store(&self.db_path, |conn| -> Result<_, StepError> {
            Ok(SqliteTimeEntryRepository::new(conn).list_entries(&query)?)
        })?;

        let shares = rolling_allocation(&records, as_of, window_days);
        let recommendations = generate_recommendations(report, &shares);
        Ok((shares, recommendations))
    }

    /// Insights and schedule actions cover `(as_of - days_back, as_of]`, the
    /// same half-open shape as the rolling allocation window.
    fn insights(
        &self,
        as_of: NaiveDate,
        days_back: u32,
    ) -> Result<(Vec<Insight>, Vec<ScheduleAction>), StepError> {
        let first_day = days_before(as_of, days_back)
            .succ_opt()
            .unwrap_or(NaiveDate::MIN);
        let query = TimeEntryQuery::between(first_day, as_of);
        let records = with_store(&self.db_path, |conn| -> Result<_, StepError> {
            Ok(SqliteTimeEntryRepository::new(conn).list_entries(&query)?)
        })?;

        let insights = Insights::new(&records, &self.config.aggregation, self.reporter).collect();
        let actions = schedule_actions(&records, self.reporter);
        Ok((insights, actions))
    }
}

fn days_before(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}
