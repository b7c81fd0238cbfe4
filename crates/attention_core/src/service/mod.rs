//! Use-case orchestration over sources, store and analysis.
//!
//! # Responsibility
//! - Sequence the run steps and account for each of them.
//! - Keep callers (CLI, tests) decoupled from SQL and collaborator details.

pub mod pipeline;
