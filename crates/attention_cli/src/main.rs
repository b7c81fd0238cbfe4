//! `attention` command line entry point.
//!
//! # Responsibility
//! - Parse flags, install file logging once, load configuration.
//! - Seed manual outcome scores, run the pipeline and print the result.

use attention_core::db::with_store;
use attention_core::repo::outcome_repo::{OutcomeRepository, SqliteOutcomeRepository};
use attention_core::{
    default_log_level, init_logging, AttentionPipeline, CalendarExportFile, EngineConfig,
    LogConfig, LogReporter, OutcomeMetric, PipelineRunResult, RepoError, RunOptions,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use clap::Parser;
use log::{error, info};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const TOP_RECOMMENDATIONS: usize = 5;

#[derive(Parser)]
#[command(
    name = "attention",
    version,
    about = "Categorize tracked time, correlate it with outcomes and recommend changes"
)]
struct Cli {
    /// SQLite store file.
    #[arg(long, default_value = "attention.sqlite3")]
    db: PathBuf,

    /// Exported calendar events (JSON list or `{"items": [...]}`).
    #[arg(long)]
    calendar_file: PathBuf,

    /// Calendar id passed to the calendar source.
    #[arg(long, default_value = "primary")]
    calendar_id: String,

    /// Days of history to import.
    #[arg(long, default_value_t = 90)]
    calendar_days: u32,

    /// Days ahead to import.
    #[arg(long, default_value_t = 7)]
    calendar_days_forward: u32,

    /// Day One export file or directory.
    #[arg(long)]
    journal_path: Option<PathBuf>,

    /// JSON array of daily outcome scores to store before the run.
    #[arg(long)]
    outcomes_file: Option<PathBuf>,

    /// Engine configuration (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Date records in this UTC offset (e.g. `+02:00`, `Z`) instead of the
    /// system zone.
    #[arg(long, value_parser = parse_utc_offset)]
    utc_offset: Option<FixedOffset>,

    /// Absolute directory for rolling log files.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    /// Also print current allocation and correlations.
    #[arg(long)]
    report: bool,

    /// Print the full run result as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = setup_logging(&cli) {
        eprintln!("logging disabled: {err}");
    }

    match run(&cli) {
        Ok(result) => {
            if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let log_dir = match &cli.log_dir {
        Some(dir) => dir.clone(),
        None => std::env::temp_dir().join("attention-logs"),
    };
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    let config = LogConfig::new(level, &log_dir.to_string_lossy())?.with_echo_warnings(true);
    init_logging(&config)?;
    Ok(())
}

fn run(cli: &Cli) -> Result<PipelineRunResult, Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    if let Some(path) = &cli.outcomes_file {
        let stored = seed_outcomes(&cli.db, path)?;
        info!("event=outcomes_seed module=cli status=ok rows={stored}");
    }

    let calendar = CalendarExportFile::new(&cli.calendar_file);
    let reporter = LogReporter;
    let pipeline = AttentionPipeline::new(&cli.db, config, &calendar, &reporter);
    let options = RunOptions {
        calendar_days_back: cli.calendar_days,
        calendar_days_forward: cli.calendar_days_forward,
        calendar_id: cli.calendar_id.clone(),
        journal_path: cli.journal_path.clone(),
        as_of: cli.as_of,
        utc_offset: cli.utc_offset,
    };
    let result = pipeline.run(&options);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, cli.report);
    }
    Ok(result)
}

fn parse_utc_offset(value: &str) -> Result<FixedOffset, String> {
    DateTime::parse_from_rfc3339(&format!("2000-01-01T00:00:00{}", value.trim()))
        .map(|at| *at.offset())
        .map_err(|_| format!("expected an offset like +02:00 or Z, got `{value}`"))
}

fn seed_outcomes(db: &Path, path: &Path) -> Result<usize, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let metrics: Vec<OutcomeMetric> = serde_json::from_str(&text)?;
    with_store(db, |conn| -> Result<(), RepoError> {
        let tx = conn.transaction()?;
        {
            let repo = SqliteOutcomeRepository::new(&tx);
            for metric in &metrics {
                repo.upsert(metric)?;
            }
        }
        tx.commit()?;
        Ok(())
    })?;
    Ok(metrics.len())
}

fn print_summary(result: &PipelineRunResult, detailed: bool) {
    println!("run {} as of {}", result.run_id, result.as_of);
    for step in &result.steps_completed {
        println!("  ok      {step}");
    }
    for failure in &result.steps_failed {
        println!("  FAILED  {}: {}", failure.step, failure.error);
    }
    for step in &result.steps_skipped {
        println!("  skipped {step}");
    }
    if result.dropped_records > 0 {
        println!("  dropped {} malformed records", result.dropped_records);
    }

    if detailed {
        println!();
        println!("Current allocation:");
        for share in &result.current_allocation {
            println!(
                "  {:<11} {:>6} min  {:>5.1}%",
                share.domain.as_str(),
                share.minutes,
                share.percentage
            );
        }
        println!();
        println!("Correlations:");
        for item in &result.correlations.matrix {
            println!(
                "  {:<11} {:<11} {:>5.2}  (n={})",
                item.domain.as_str(),
                item.metric.as_str(),
                item.coefficient,
                item.samples
            );
        }
        if !result.daily_emotions.is_empty() {
            println!();
            println!("Emotions:");
            for row in &result.daily_emotions {
                println!(
                    "  {}  {:<11} {:>3}  {:>5.1}%",
                    row.date,
                    row.emotion,
                    row.entries,
                    row.share * 100.0
                );
            }
        }
    }

    println!();
    println!("Recommendations:");
    if result.recommendations.is_empty() {
        println!("  none");
    }
    for rec in result.recommendations.iter().take(TOP_RECOMMENDATIONS) {
        println!(
            "  [{}] {} {}: {:.1}% -> {:.1}%  ({})",
            rec.priority,
            rec.action,
            rec.domain,
            rec.current_percentage,
            rec.suggested_percentage,
            rec.reason
        );
    }

    println!();
    println!("Schedule:");
    for action in &result.schedule_actions {
        println!("  - {}", action.message);
    }

    println!();
    println!("Insights:");
    for insight in &result.insights {
        println!("  - {}", insight.message);
    }
}
