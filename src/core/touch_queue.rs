//! Change-notification buffer: "(owner, job?, day) needs recompute".

use crate::errors::AppResult;
use crate::models::owner::Owner;
use crate::models::touch::{Touch, TouchGroup};
use crate::utils::date::format_day;
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, TransactionBehavior, params};
use std::collections::HashMap;

pub struct TouchQueue;

impl TouchQueue {
    /// Append a touch. Duplicates are fine; they coalesce at claim time.
    pub fn enqueue(conn: &Connection, owner: &Owner, job_ref: Option<&str>, day: NaiveDate) -> AppResult<i64> {
        let job_ref = job_ref.map(str::trim).filter(|s| !s.is_empty());

        conn.execute(
            "INSERT INTO touches (owner, job_ref, day, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![owner.as_str(), job_ref, format_day(&day), Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Remove and return up to `limit` of the oldest touches.
    ///
    /// Deletion happens here, inside the same write transaction as the
    /// read: there is no acknowledgement, so a group that later fails
    /// stays stale until something touches it again.
    pub fn claim_batch(conn: &mut Connection, limit: usize) -> AppResult<Vec<Touch>> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let touches = {
            let mut stmt = tx.prepare_cached(
                "SELECT id, owner, job_ref, day FROM touches ORDER BY id ASC LIMIT ?1",
            )?;
            let rows = stmt.query_map([limit as i64], |row| {
                Ok(Touch {
                    id: row.get(0)?,
                    owner: row.get(1)?,
                    job_ref: row.get(2)?,
                    day: row.get(3)?,
                })
            })?;

            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            out
        };

        if let (Some(first), Some(last)) = (touches.first(), touches.last()) {
            tx.execute(
                "DELETE FROM touches WHERE id >= ?1 AND id <= ?2",
                params![first.id, last.id],
            )?;
        }

        tx.commit()?;
        Ok(touches)
    }

    pub fn pending(conn: &Connection) -> AppResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM touches", [], |row| row.get(0))?)
    }
}

/// Collapse claimed touches into one group per (owner, day), keeping the
/// order in which each group was first touched.
pub fn group_touches(touches: &[Touch]) -> Vec<TouchGroup> {
    let mut groups: Vec<TouchGroup> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for t in touches {
        let key = (t.owner.trim().to_string(), t.day.trim().to_string());

        let pos = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(TouchGroup {
                owner: key.0,
                day: key.1,
                job_refs: Vec::new(),
                touch_count: 0,
            });
            groups.len() - 1
        });

        let group = &mut groups[pos];
        group.touch_count += 1;

        if let Some(job) = t.job_ref.as_deref().map(str::trim).filter(|s| !s.is_empty())
            && !group.job_refs.iter().any(|j| j == job)
        {
            group.job_refs.push(job.to_string());
        }
    }

    groups
}
