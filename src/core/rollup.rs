//! Persisted per-employee, per-job, per-day minutes.

use crate::errors::AppResult;
use crate::models::owner::Owner;
use crate::models::rollup::TimesheetRollup;
use chrono::Utc;
use rusqlite::{Connection, params};
use std::collections::{BTreeSet, HashSet};

/// Insert or fully replace the row for (owner, day, employee, job).
pub fn upsert_rollup(conn: &Connection, r: &TimesheetRollup) -> AppResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO timesheet_rollups
             (owner, day, employee_name, job_ref,
              shift_minutes, break_minutes, drive_minutes, paid_minutes, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(owner, day, employee_name, job_ref) DO UPDATE SET
             shift_minutes = excluded.shift_minutes,
             break_minutes = excluded.break_minutes,
             drive_minutes = excluded.drive_minutes,
             paid_minutes  = excluded.paid_minutes,
             updated_at    = excluded.updated_at",
    )?;

    stmt.execute(params![
        r.owner,
        r.day,
        r.employee_name,
        r.job_ref,
        r.shift_minutes,
        r.break_minutes,
        r.drive_minutes,
        r.paid_minutes,
        Utc::now().to_rfc3339(),
    ])?;
    Ok(())
}

/// Make the stored rollups for (owner, day) equal `rollups`.
///
/// Rows whose (employee, job) is no longer produced are deleted, so a
/// corrected punch that moves an employee to another job converges.
/// Returns the job_nos that had rollups before this call.
pub fn replace_day(
    conn: &Connection,
    owner: &Owner,
    day: &str,
    rollups: &[TimesheetRollup],
) -> AppResult<BTreeSet<i64>> {
    let existing: Vec<(String, i64)> = {
        let mut stmt = conn.prepare_cached(
            "SELECT employee_name, job_ref FROM timesheet_rollups WHERE owner = ?1 AND day = ?2",
        )?;
        let rows = stmt.query_map(params![owner.as_str(), day], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        out
    };

    let keep: HashSet<(&str, i64)> = rollups
        .iter()
        .map(|r| (r.employee_name.as_str(), r.job_ref))
        .collect();

    let mut stale = conn.prepare_cached(
        "DELETE FROM timesheet_rollups
         WHERE owner = ?1 AND day = ?2 AND employee_name = ?3 AND job_ref = ?4",
    )?;
    for (employee, job) in &existing {
        if !keep.contains(&(employee.as_str(), *job)) {
            stale.execute(params![owner.as_str(), day, employee, job])?;
        }
    }

    for r in rollups {
        upsert_rollup(conn, r)?;
    }

    Ok(existing.into_iter().map(|(_, job)| job).collect())
}
