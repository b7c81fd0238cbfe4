//! Derived daily allocation rows.
//!
//! # Invariants
//! - The table holds exactly the output of the latest aggregation; callers
//!   replace it wholesale, inside their transaction.

use crate::model::metrics::DailyAllocation;
use crate::repo::{parse_date, parse_domain, RepoResult, DATE_FORMAT};
use rusqlite::{params, Connection};

pub trait AllocationRepository {
    /// Deletes every stored row and inserts `rows`.
    fn replace_daily_allocations(&self, rows: &[DailyAllocation]) -> RepoResult<()>;
    fn list_daily_allocations(&self) -> RepoResult<Vec<DailyAllocation>>;
}

pub struct SqliteAllocationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAllocationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AllocationRepository for SqliteAllocationRepository<'_> {
    fn replace_daily_allocations(&self, rows: &[DailyAllocation]) -> RepoResult<()> {
        self.conn.execute("DELETE FROM daily_allocations;", [])?;

        let mut stmt = self.conn.prepare(
            "INSERT INTO daily_allocations (date, domain, minutes, percentage)
             VALUES (?1, ?2, ?3, ?4);",
        )?;
        for row in rows {
            stmt.execute(params![
                row.date.format(DATE_FORMAT).to_string(),
                row.domain.as_str(),
                row.absolute_minutes,
                row.percentage_of_day,
            ])?;
        }

        Ok(())
    }

    fn list_daily_allocations(&self) -> RepoResult<Vec<DailyAllocation>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, domain, minutes, percentage
             FROM daily_allocations
             ORDER BY date ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut allocations = Vec::new();
        while let Some(row) = rows.next()? {
            let date_text: String = row.get("date")?;
            let domain_text: String = row.get("domain")?;
            allocations.push(DailyAllocation {
                date: parse_date(&date_text, "daily_allocations.date")?,
                domain: parse_domain(&domain_text, "daily_allocations.domain")?,
                absolute_minutes: row.get("minutes")?,
                percentage_of_day: row.get("percentage")?,
            });
        }
        allocations.sort_by(|a, b| a.date.cmp(&b.date).then(a.domain.cmp(&b.domain)));
        Ok(allocations)
    }
}
