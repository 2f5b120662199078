#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use jobkpi::config::Config;
use jobkpi::db::initialize::init_db;
use jobkpi::db::pool::DbPool;
use jobkpi::models::event_type::TimeEventKind;
use rusqlite::{Connection, params};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub fn jobkpi() -> Command {
    cargo_bin_cmd!("jobkpi")
}

/// Create a unique test DB path inside the system temp dir and remove any
/// existing file (and its WAL side files).
pub fn setup_test_db(name: &str) -> String {
    let db_path = test_db_path(name);
    for suffix in ["", "-wal", "-shm"] {
        fs::remove_file(format!("{db_path}{suffix}")).ok();
    }
    db_path
}

/// Where `setup_test_db(name)` puts its database, without touching it.
pub fn test_db_path(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_jobkpi.sqlite", name));
    path.to_string_lossy().to_string()
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Fresh, migrated database.
pub fn open_test_db(name: &str) -> (DbPool, Config) {
    let db_path = setup_test_db(name);
    let mut cfg = Config::with_database(db_path.clone());
    cfg.retry_backoff_ms = 5;
    let pool = DbPool::open(&db_path, Duration::from_secs(10)).expect("open db");
    init_db(&pool.conn).expect("init db");
    (pool, cfg)
}

/// Append a clock event the way the clock command handler would.
pub fn punch(conn: &Connection, owner: &str, employee: &str, kind: TimeEventKind, ts: &str, job: Option<&str>) {
    conn.execute(
        "INSERT INTO time_events (owner, employee_name, kind, ts, job_ref) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![owner, employee, kind.to_db_str(), ts, job],
    )
    .expect("insert time event");
}

/// Mike's day on job 8: 08:00-16:30 with a 12:00-12:30 break.
pub fn punch_mike_day(conn: &Connection, owner: &str) {
    punch(conn, owner, "Mike", TimeEventKind::ClockIn, "2025-03-10T08:00:00Z", Some("8"));
    punch(conn, owner, "Mike", TimeEventKind::BreakStart, "2025-03-10T12:00:00Z", Some("8"));
    punch(conn, owner, "Mike", TimeEventKind::BreakStop, "2025-03-10T12:30:00Z", Some("8"));
    punch(conn, owner, "Mike", TimeEventKind::ClockOut, "2025-03-10T16:30:00Z", Some("8"));
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .expect("count rows")
}
