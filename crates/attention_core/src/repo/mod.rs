//! Persistence for classified time, outcomes, journal facts and derived
//! allocations.
//!
//! # Responsibility
//! - Define narrow repository contracts the pipeline depends on.
//! - Keep SQL inside the SQLite implementations.
//!
//! # Invariants
//! - Writes are idempotent upserts keyed by the natural key (source record id
//!   or date).
//! - Reads reject invalid persisted values instead of masking them.

use crate::db::DbError;
use crate::model::domain::DomainLabel;
use crate::model::outcome::OutcomeValidationError;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod allocation_repo;
pub mod journal_repo;
pub mod outcome_repo;
pub mod time_entry_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository failure.
#[derive(Debug)]
pub enum RepoError {
    Validation(OutcomeValidationError),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<OutcomeValidationError> for RepoError {
    fn from(value: OutcomeValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_domain(value: &str, column: &str) -> RepoResult<DomainLabel> {
    DomainLabel::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid domain `{value}` in {column}")))
}

pub(crate) fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}
