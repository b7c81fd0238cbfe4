use attention_core::db::migrations::{current_user_version, latest_version};
use attention_core::db::{open_db, open_db_in_memory, with_store, DbError};
use rusqlite::Connection;

#[test]
fn fresh_store_has_every_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    for table in [
        "activities",
        "time_entries",
        "outcome_metrics",
        "journal_entries",
        "daily_allocations",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reopening_a_store_file_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attention.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO outcome_metrics (date, happiness) VALUES ('2024-03-01', 7);",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM outcome_metrics;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn store_from_a_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn with_store_surfaces_open_errors_through_caller_error_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let mut ran = false;
    let result: Result<(), DbError> = with_store(&path, |_conn| {
        ran = true;
        Ok(())
    });
    assert!(matches!(
        result,
        Err(DbError::UnsupportedSchemaVersion { .. })
    ));
    assert!(!ran);
}

#[test]
fn allocation_percentages_are_range_checked_by_schema() {
    let conn = open_db_in_memory().unwrap();
    let err = conn.execute(
        "INSERT INTO daily_allocations (date, domain, minutes, percentage)
         VALUES ('2024-03-01', 'Growth', 30, 140.0);",
        [],
    );
    assert!(err.is_err());
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
