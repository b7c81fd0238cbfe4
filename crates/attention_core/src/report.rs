//! Injectable run reporting.
//!
//! # Responsibility
//! - Give analysis components a narrow, passed-in channel for diagnostics.
//! - Forward to the `log` facade in production and capture events in tests.
//!
//! # Invariants
//! - Reported details are metadata only (ids, counts, reasons), never free
//!   journal text.
//! - Reporting never fails and never panics.

use log::Level;
use std::cell::RefCell;

/// One reported diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEvent {
    pub level: Level,
    pub module: &'static str,
    pub event: &'static str,
    /// `key=value` pairs, already formatted.
    pub detail: String,
}

/// Sink for component diagnostics.
pub trait Reporter {
    fn report(&self, event: ReportEvent);

    fn debug(&self, module: &'static str, event: &'static str, detail: String) {
        self.report(ReportEvent {
            level: Level::Debug,
            module,
            event,
            detail,
        });
    }

    fn info(&self, module: &'static str, event: &'static str, detail: String) {
        self.report(ReportEvent {
            level: Level::Info,
            module,
            event,
            detail,
        });
    }

    fn warn(&self, module: &'static str, event: &'static str, detail: String) {
        self.report(ReportEvent {
            level: Level::Warn,
            module,
            event,
            detail,
        });
    }

    fn error(&self, module: &'static str, event: &'static str, detail: String) {
        self.report(ReportEvent {
            level: Level::Error,
            module,
            event,
            detail,
        });
    }
}

/// Reporter that forwards to whatever `log` backend the process installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: ReportEvent) {
        log::log!(
            event.level,
            "event={} module={} {}",
            event.event,
            event.module,
            event.detail
        );
    }
}

/// Reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: RefCell<Vec<ReportEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all events reported so far.
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.borrow().clone()
    }

    /// Counts events with the given event name.
    pub fn count(&self, event: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|item| item.event == event)
            .count()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: ReportEvent) {
        self.events.borrow_mut().push(event);
    }
}
