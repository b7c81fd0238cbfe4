//! Attention portfolio core: categorizes tracked time into life domains,
//! aggregates daily allocation, correlates it with outcome scores and turns
//! the result into recommendations and insights.

pub mod analysis;
pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod repo;
pub mod report;
pub mod service;

pub use analysis::categorize::{categorize, categorize_with_match};
pub use config::{ConfigError, EngineConfig, KeywordConfig};
pub use ingest::calendar_export::CalendarExportFile;
pub use ingest::dayone::DayOneExportSource;
pub use ingest::source::{CalendarQuery, CalendarSource, JournalSource, SourceError, SourceResult};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::activity::{ActivityRecord, ClassifiedRecord, RecordSource};
pub use model::advice::{
    Action, Insight, InsightKind, Priority, Recommendation, ScheduleAction, ScheduleActionKind,
};
pub use model::domain::DomainLabel;
pub use model::metrics::{
    CorrelationReport, CorrelationResult, DailyAllocation, DailyEmotion, DomainShare,
};
pub use model::outcome::{OutcomeKind, OutcomeMetric};
pub use repo::{RepoError, RepoResult};
pub use report::{LogReporter, RecordingReporter, Reporter};
pub use service::pipeline::{
    AttentionPipeline, PipelineRunResult, RunOptions, StepError, StepFailure, StepName,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
