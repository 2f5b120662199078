//! Job lookup and per-owner job_no allocation.

use crate::db::log::ttlog;
use crate::errors::{AppError, AppResult};
use crate::models::job::{Job, normalize_job_name};
use crate::models::owner::Owner;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use sha2::{Digest, Sha256};

const MAX_JOB_NAME_LEN: usize = 200;

fn map_job(row: &Row) -> rusqlite::Result<Job> {
    Ok(Job {
        owner: row.get("owner")?,
        job_no: row.get("job_no")?,
        name: row.get("name")?,
        active: row.get::<_, i64>("active")? == 1,
        created_at: row.get("created_at")?,
    })
}

/// Stable lock key for an owner: the first 8 bytes of SHA-256(owner).
/// Identical in every process, so all workers contend on the same row.
pub fn lock_key(owner: &Owner) -> i64 {
    let digest = Sha256::digest(owner.as_str().as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}

pub fn find_job_by_name(conn: &Connection, owner: &Owner, name: &str) -> AppResult<Option<Job>> {
    let mut stmt = conn.prepare_cached(
        "SELECT owner, job_no, name, active, created_at
         FROM jobs WHERE owner = ?1 AND name_norm = ?2",
    )?;
    Ok(stmt
        .query_row(params![owner.as_str(), normalize_job_name(name)], map_job)
        .optional()?)
}

pub fn find_job_by_no(conn: &Connection, owner: &Owner, job_no: i64) -> AppResult<Option<Job>> {
    let mut stmt = conn.prepare_cached(
        "SELECT owner, job_no, name, active, created_at
         FROM jobs WHERE owner = ?1 AND job_no = ?2",
    )?;
    Ok(stmt.query_row(params![owner.as_str(), job_no], map_job).optional()?)
}

pub fn list_jobs(conn: &Connection, owner: &Owner) -> AppResult<Vec<Job>> {
    let mut stmt = conn.prepare_cached(
        "SELECT owner, job_no, name, active, created_at
         FROM jobs WHERE owner = ?1 ORDER BY job_no ASC",
    )?;
    let rows = stmt.query_map([owner.as_str()], map_job)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Take the owner's allocation lock for the rest of the transaction.
/// The row write holds the store's write lock until commit or rollback.
fn acquire_advisory_lock(conn: &Connection, owner: &Owner) -> AppResult<()> {
    conn.execute(
        "INSERT INTO advisory_locks (lock_key, owner, acquired_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(lock_key) DO UPDATE SET
             owner = excluded.owner,
             acquired_at = excluded.acquired_at",
        params![lock_key(owner), owner.as_str(), Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn validate_name(name: &str) -> AppResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_JOB_NAME_LEN {
        return Err(AppError::InvalidJobName(name.to_string()));
    }
    Ok(trimmed)
}

/// Return the owner's job called `name` (case-insensitive), creating it
/// with the next job_no if it does not exist.
///
/// Creation runs under the owner's advisory lock and re-checks for the
/// name once the lock is held. Should an insert still collide on a
/// uniqueness constraint, the row that won is returned instead.
pub fn ensure_job_by_name(conn: &mut Connection, owner: &Owner, name: &str) -> AppResult<Job> {
    let name = validate_name(name)?;

    if let Some(job) = find_job_by_name(conn, owner, name)? {
        return Ok(job);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    acquire_advisory_lock(&tx, owner)?;

    if let Some(job) = find_job_by_name(&tx, owner, name)? {
        tx.commit()?;
        return Ok(job);
    }

    let next_job_no: i64 = tx.query_row(
        "SELECT COALESCE(MAX(job_no), 0) + 1 FROM jobs WHERE owner = ?1",
        [owner.as_str()],
        |row| row.get(0),
    )?;

    let inserted = tx
        .execute(
            "INSERT INTO jobs (owner, job_no, name, name_norm, active, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                owner.as_str(),
                next_job_no,
                name,
                normalize_job_name(name),
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(AppError::from);

    match inserted {
        Ok(_) => {
            ttlog(
                &tx,
                "job_allocated",
                &format!("{owner}#{next_job_no}"),
                &format!("Allocated job_no {next_job_no} for '{name}'"),
            )?;
            tx.commit()?;
            tracing::info!(owner = %owner, job_no = next_job_no, name, "job allocated");

            find_job_by_no(conn, owner, next_job_no)?
                .ok_or_else(|| AppError::Other(format!("job {owner}#{next_job_no} vanished after insert")))
        }
        Err(e) if e.is_unique_violation() => {
            drop(tx);
            tracing::debug!(owner = %owner, name, "allocation raced, re-selecting winner");
            find_job_by_name(conn, owner, name)?.ok_or(e)
        }
        Err(e) => Err(e),
    }
}
