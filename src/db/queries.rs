use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::event::TimeEvent;
use crate::models::event_type::TimeEventKind;
use crate::models::job::JobRef;
use crate::models::kpi::JobKpiDaily;
use crate::models::owner::{Owner, OwnerSettings, parse_timezone};
use crate::models::rollup::TimesheetRollup;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};
use std::collections::HashMap;

fn conversion_error(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

pub fn map_time_event(row: &Row) -> Result<TimeEvent> {
    let kind_str: String = row.get("kind")?;
    let kind = TimeEventKind::from_db_str(&kind_str)
        .ok_or_else(|| conversion_error(0, AppError::InvalidEventType(kind_str.clone())))?;

    let ts_str: String = row.get("ts")?;
    let ts = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| conversion_error(0, AppError::InvalidTimestamp(ts_str.clone())))?;

    let job_ref: Option<String> = row.get("job_ref")?;

    Ok(TimeEvent {
        id: row.get("id")?,
        owner: row.get("owner")?,
        employee_name: row.get("employee_name")?,
        kind,
        ts,
        job_ref: job_ref.as_deref().and_then(JobRef::parse),
    })
}

/// Unwrap row-conversion failures back into the input error they carry,
/// so a bad punch is reported as a fatal input problem for its group.
fn lift_conversion(e: rusqlite::Error) -> AppError {
    if let rusqlite::Error::FromSqlConversionFailure(_, _, inner) = e {
        return match inner.downcast::<AppError>() {
            Ok(app) => *app,
            Err(other) => AppError::Other(other.to_string()),
        };
    }
    AppError::Db(e)
}

pub fn to_db_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Events for `owner` with `from <= ts < to`, ordered per employee by time.
pub fn load_time_events(
    conn: &Connection,
    owner: &Owner,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<Vec<TimeEvent>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, owner, employee_name, kind, ts, job_ref
         FROM time_events
         WHERE owner = ?1
           AND julianday(ts) >= julianday(?2)
           AND julianday(ts) <  julianday(?3)
         ORDER BY employee_name ASC, id ASC",
    )?;

    let rows = stmt.query_map(
        params![owner.as_str(), to_db_ts(&from), to_db_ts(&to)],
        map_time_event,
    )?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(lift_conversion)?);
    }

    // Stable: equal timestamps keep insertion (id) order.
    out.sort_by(|a, b| a.employee_name.cmp(&b.employee_name).then(a.ts.cmp(&b.ts)));
    Ok(out)
}

pub fn load_hourly_rates(conn: &Connection, owner: &Owner) -> AppResult<HashMap<String, f64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT employee_name, hourly_rate FROM employee_rates WHERE owner = ?1",
    )?;
    let rows = stmt.query_map([owner.as_str()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;

    let mut out = HashMap::new();
    for r in rows {
        let (name, rate) = r?;
        out.insert(name, rate);
    }
    Ok(out)
}

pub fn set_hourly_rate(conn: &Connection, owner: &Owner, employee: &str, rate: f64) -> AppResult<()> {
    conn.execute(
        "INSERT INTO employee_rates (owner, employee_name, hourly_rate)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(owner, employee_name) DO UPDATE SET hourly_rate = excluded.hourly_rate",
        params![owner.as_str(), employee, rate],
    )?;
    Ok(())
}

/// Owner policy row, falling back to the configured defaults.
pub fn load_owner_settings(conn: &Connection, owner: &Owner, cfg: &Config) -> AppResult<OwnerSettings> {
    let row: Option<(String, i64)> = conn
        .query_row(
            "SELECT timezone, daily_ot_threshold_minutes FROM owner_settings WHERE owner = ?1",
            [owner.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (tz_name, ot) = row.unwrap_or_else(|| {
        (
            cfg.default_timezone.clone(),
            cfg.default_ot_threshold_minutes,
        )
    });

    Ok(OwnerSettings {
        owner: owner.clone(),
        timezone: parse_timezone(&tz_name)?,
        daily_ot_threshold_minutes: ot.max(0),
    })
}

pub fn set_owner_settings(
    conn: &Connection,
    owner: &Owner,
    timezone: Option<&str>,
    ot_threshold: Option<i64>,
) -> AppResult<()> {
    if let Some(tz) = timezone {
        parse_timezone(tz)?;
    }

    conn.execute(
        "INSERT INTO owner_settings (owner, timezone, daily_ot_threshold_minutes)
         VALUES (?1, COALESCE(?2, 'UTC'), COALESCE(?3, 0))
         ON CONFLICT(owner) DO UPDATE SET
             timezone = COALESCE(?2, owner_settings.timezone),
             daily_ot_threshold_minutes = COALESCE(?3, owner_settings.daily_ot_threshold_minutes)",
        params![owner.as_str(), timezone, ot_threshold],
    )?;
    Ok(())
}

fn map_rollup(row: &Row) -> Result<TimesheetRollup> {
    Ok(TimesheetRollup {
        owner: row.get("owner")?,
        day: row.get("day")?,
        employee_name: row.get("employee_name")?,
        job_ref: row.get("job_ref")?,
        shift_minutes: row.get("shift_minutes")?,
        break_minutes: row.get("break_minutes")?,
        drive_minutes: row.get("drive_minutes")?,
        paid_minutes: row.get("paid_minutes")?,
    })
}

/// Rollups for `owner` with `from <= day <= to`.
pub fn list_rollups(conn: &Connection, owner: &Owner, from: &str, to: &str) -> AppResult<Vec<TimesheetRollup>> {
    let mut stmt = conn.prepare_cached(
        "SELECT owner, day, employee_name, job_ref,
                shift_minutes, break_minutes, drive_minutes, paid_minutes
         FROM timesheet_rollups
         WHERE owner = ?1 AND day >= ?2 AND day <= ?3
         ORDER BY day ASC, job_ref ASC, employee_name ASC",
    )?;
    let rows = stmt.query_map(params![owner.as_str(), from, to], map_rollup)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn map_kpi(row: &Row) -> Result<JobKpiDaily> {
    Ok(JobKpiDaily {
        owner: row.get("owner")?,
        day: row.get("day")?,
        job_ref: row.get("job_ref")?,
        paid_minutes: row.get("paid_minutes")?,
        drive_minutes: row.get("drive_minutes")?,
        labour_cost: row.get("labour_cost")?,
        ot_minutes: row.get("ot_minutes")?,
        revenue: row.get("revenue")?,
        cogs: row.get("cogs")?,
        gross_profit: row.get("gross_profit")?,
        gross_margin_pct: row.get("gross_margin_pct")?,
        change_order_amount: row.get("change_order_amount")?,
        holdback_amount: row.get("holdback_amount")?,
        ar_total: row.get("ar_total")?,
        ap_total: row.get("ap_total")?,
        slippage: row.get("slippage")?,
    })
}

const KPI_COLUMNS: &str = "owner, day, job_ref, paid_minutes, drive_minutes, labour_cost, ot_minutes,
     revenue, cogs, gross_profit, gross_margin_pct, change_order_amount,
     holdback_amount, ar_total, ap_total, slippage";

/// KPI rows for `owner` with `from <= day <= to`.
pub fn list_kpis(conn: &Connection, owner: &Owner, from: &str, to: &str) -> AppResult<Vec<JobKpiDaily>> {
    let sql = format!(
        "SELECT {KPI_COLUMNS} FROM job_kpi_daily
         WHERE owner = ?1 AND day >= ?2 AND day <= ?3
         ORDER BY day ASC, job_ref ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner.as_str(), from, to], map_kpi)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn load_kpi(conn: &Connection, owner: &Owner, day: &str, job_no: i64) -> AppResult<Option<JobKpiDaily>> {
    let sql = format!(
        "SELECT {KPI_COLUMNS} FROM job_kpi_daily
         WHERE owner = ?1 AND day = ?2 AND job_ref = ?3"
    );
    Ok(conn
        .query_row(&sql, params![owner.as_str(), day, job_no], map_kpi)
        .optional()?)
}
