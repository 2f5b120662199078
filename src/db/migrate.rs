use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, params};

/// Ensure that the `log` table exists. Every other migration records
/// itself there, so it comes first and is not versioned.
fn ensure_log_table(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn migration_applied(conn: &Connection, version: &str) -> AppResult<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> AppResult<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        params![version, message],
    )?;
    Ok(())
}

const CORE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS touches (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        owner       TEXT NOT NULL,
        job_ref     TEXT,
        day         TEXT NOT NULL,
        created_at  TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS time_events (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        owner          TEXT NOT NULL,
        employee_name  TEXT NOT NULL,
        kind           TEXT NOT NULL CHECK(kind IN (
                           'clock_in','clock_out',
                           'break_start','break_stop',
                           'drive_start','drive_stop')),
        ts             TEXT NOT NULL,
        job_ref        TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_time_events_owner_ts ON time_events(owner, ts);

    CREATE TABLE IF NOT EXISTS jobs (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        owner       TEXT NOT NULL,
        job_no      INTEGER NOT NULL,
        name        TEXT NOT NULL,
        name_norm   TEXT NOT NULL,
        active      INTEGER NOT NULL DEFAULT 1,
        created_at  TEXT NOT NULL,
        UNIQUE(owner, job_no),
        UNIQUE(owner, name_norm)
    );

    CREATE TABLE IF NOT EXISTS advisory_locks (
        lock_key     INTEGER PRIMARY KEY,
        owner        TEXT NOT NULL,
        acquired_at  TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS employee_rates (
        owner          TEXT NOT NULL,
        employee_name  TEXT NOT NULL,
        hourly_rate    REAL NOT NULL,
        PRIMARY KEY (owner, employee_name)
    );

    CREATE TABLE IF NOT EXISTS owner_settings (
        owner                       TEXT PRIMARY KEY,
        timezone                    TEXT NOT NULL DEFAULT 'UTC',
        daily_ot_threshold_minutes  INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS timesheet_rollups (
        owner          TEXT NOT NULL,
        day            TEXT NOT NULL,
        employee_name  TEXT NOT NULL,
        job_ref        INTEGER NOT NULL,
        shift_minutes  INTEGER NOT NULL,
        break_minutes  INTEGER NOT NULL,
        drive_minutes  INTEGER NOT NULL,
        paid_minutes   INTEGER NOT NULL,
        updated_at     TEXT NOT NULL,
        PRIMARY KEY (owner, day, employee_name, job_ref)
    );

    CREATE TABLE IF NOT EXISTS job_kpi_daily (
        owner                TEXT NOT NULL,
        day                  TEXT NOT NULL,
        job_ref              INTEGER NOT NULL,
        paid_minutes         INTEGER,
        drive_minutes        INTEGER,
        labour_cost          REAL,
        ot_minutes           INTEGER,
        revenue              REAL,
        cogs                 REAL,
        gross_profit         REAL,
        gross_margin_pct     REAL,
        change_order_amount  REAL,
        holdback_amount      REAL,
        ar_total             REAL,
        ap_total             REAL,
        slippage             REAL,
        updated_at           TEXT NOT NULL,
        PRIMARY KEY (owner, day, job_ref)
    );
"#;

/// Ordered list of (version, description, DDL).
const MIGRATIONS: &[(&str, &str, &str)] = &[(
    "20250301_0001_core_schema",
    "Created touch queue, time events, jobs, rollups and KPI tables",
    CORE_SCHEMA,
)];

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    ensure_log_table(conn)?;

    for (version, message, ddl) in MIGRATIONS {
        if migration_applied(conn, version)? {
            continue;
        }

        conn.execute_batch(ddl)
            .map_err(|e| AppError::Migration(format!("{version}: {e}")))?;
        mark_applied(conn, version, message)?;

        tracing::info!(version, "migration applied");
    }

    Ok(())
}

/// Versions already recorded in the log table, oldest first.
pub fn applied_versions(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
