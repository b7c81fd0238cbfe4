//! Domain model for activity, outcome and analysis data.
//!
//! # Responsibility
//! - Define canonical data structures shared by ingest, analysis and storage.
//! - Keep derived output shapes (allocations, correlations, advice) explicit.
//!
//! # Invariants
//! - Activity records are immutable once constructed.
//! - Derived rows are recomputed per run and never mutated incrementally.

pub mod activity;
pub mod advice;
pub mod domain;
pub mod metrics;
pub mod outcome;
