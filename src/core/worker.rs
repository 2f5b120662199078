//! One-shot batch: claim touches, coalesce, recompute each (owner, day).

use crate::config::Config;
use crate::core::aggregate::aggregate_job_day;
use crate::core::calculator::timesheet::build_rollups;
use crate::core::calculator::window::DayWindow;
use crate::core::finance::FinanceEnricher;
use crate::core::jobs::ensure_job_by_name;
use crate::core::kpi_store::upsert_kpi;
use crate::core::rollup::replace_day;
use crate::core::touch_queue::{TouchQueue, group_touches};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::{load_hourly_rates, load_owner_settings, load_time_events};
use crate::db::retry::{RetryPolicy, with_retry};
use crate::errors::{AppError, AppResult};
use crate::models::job::{JobRef, UNASSIGNED_JOB_NO};
use crate::models::owner::Owner;
use crate::models::touch::TouchGroup;
use crate::utils::date::{format_day, parse_day};
use chrono::NaiveDate;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::thread;

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct BatchReport {
    pub claimed: usize,
    pub groups: usize,
    pub applied: usize,
    pub failed: usize,
    pub kpi_rows: usize,
}

#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct GroupOutcome {
    pub rollups: usize,
    pub kpi_rows: usize,
}

/// Resolve every distinct job reference to a job_no, allocating jobs for
/// names seen for the first time.
fn resolve_job_refs<'a>(
    conn: &mut Connection,
    owner: &Owner,
    refs: impl IntoIterator<Item = &'a JobRef>,
    retry: RetryPolicy,
) -> AppResult<HashMap<JobRef, i64>> {
    let mut out = HashMap::new();

    for r in refs {
        if out.contains_key(r) {
            continue;
        }
        let job_no = match r {
            JobRef::No(n) => *n,
            JobRef::Name(name) => {
                with_retry(retry, "ensure_job_by_name", || ensure_job_by_name(conn, owner, name))?.job_no
            }
        };
        out.insert(r.clone(), job_no);
    }

    Ok(out)
}

/// Recompute rollups and KPI rows for one (owner, day).
///
/// `touched_jobs` are jobs named by the triggering touches; they get a
/// finance refresh even when nobody clocked time against them.
pub fn recompute_day(
    conn: &mut Connection,
    cfg: &Config,
    enricher: &FinanceEnricher,
    owner: &Owner,
    day: NaiveDate,
    touched_jobs: &[JobRef],
) -> AppResult<GroupOutcome> {
    let retry = RetryPolicy::from_config(cfg);
    let day_str = format_day(&day);

    let settings = load_owner_settings(conn, owner, cfg)?;
    let window = DayWindow::new(settings.timezone, day)?;
    let (from, to) = window.fetch_range();

    let events = with_retry(retry, "load_time_events", || load_time_events(conn, owner, from, to))?;

    let job_map = resolve_job_refs(
        conn,
        owner,
        events
            .iter()
            .filter_map(|e| e.job_ref.as_ref())
            .chain(touched_jobs.iter()),
        retry,
    )?;

    let rollups = build_rollups(owner, &day_str, &window, &events, &job_map);
    let rates = load_hourly_rates(conn, owner)?;
    let labour = aggregate_job_day(&rollups, &rates, settings.daily_ot_threshold_minutes);

    let touched: BTreeSet<i64> = touched_jobs.iter().filter_map(|r| job_map.get(r).copied()).collect();

    with_retry(retry, "apply_group", || {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = replace_day(&tx, owner, &day_str, &rollups)?;

        // Jobs that lost all their minutes are zeroed, not left stale.
        let mut labour = labour.clone();
        for job in previous {
            labour.entry(job).or_default();
        }

        let mut jobs: BTreeSet<i64> = labour.keys().copied().collect();
        jobs.extend(touched.iter().copied());

        for &job_no in &jobs {
            let finance = if job_no == UNASSIGNED_JOB_NO {
                None
            } else {
                Some(enricher.compute_finance_kpis(&tx, owner.as_str(), job_no, &day_str)?)
            };
            upsert_kpi(&tx, owner, &day_str, job_no, labour.get(&job_no), finance.as_ref())?;
        }

        tx.commit()?;

        Ok(GroupOutcome {
            rollups: rollups.len(),
            kpi_rows: jobs.len(),
        })
    })
}

/// Validate a claimed group and recompute it.
pub fn process_group(
    conn: &mut Connection,
    cfg: &Config,
    enricher: &FinanceEnricher,
    group: &TouchGroup,
) -> AppResult<GroupOutcome> {
    let owner = Owner::parse(&group.owner)?;
    let day = parse_day(&group.day)?;
    let touched: Vec<JobRef> = group.job_refs.iter().filter_map(|r| JobRef::parse(r)).collect();

    recompute_day(conn, cfg, enricher, &owner, day, &touched)
}

pub type GroupResult = (TouchGroup, AppResult<GroupOutcome>);

/// Split `groups` into at most `workers` chunks and run `work` on each in a
/// scoped thread. Every group comes back exactly once: the groups of a chunk
/// whose thread panicked are reported as failures.
pub fn fan_out<F>(groups: &[TouchGroup], workers: usize, work: F) -> Vec<GroupResult>
where
    F: Fn(&[TouchGroup]) -> Vec<GroupResult> + Sync,
{
    let workers = workers.clamp(1, groups.len().max(1));
    let chunk_size = groups.len().div_ceil(workers).max(1);
    let work = &work;

    thread::scope(|s| {
        let handles: Vec<_> = groups
            .chunks(chunk_size)
            .map(|chunk| (chunk, s.spawn(move || work(chunk))))
            .collect();

        handles
            .into_iter()
            .flat_map(|(chunk, h)| match h.join() {
                Ok(results) => results,
                Err(_) => {
                    tracing::error!(groups = chunk.len(), "recompute worker panicked");
                    chunk
                        .iter()
                        .map(|g| (g.clone(), Err(AppError::Other("recompute worker panicked".into()))))
                        .collect()
                }
            })
            .collect()
    })
}

/// Spread groups over `cfg.fan_out` workers, one connection each.
fn process_parallel(cfg: &Config, enricher: &FinanceEnricher, groups: &[TouchGroup]) -> Vec<GroupResult> {
    fan_out(groups, cfg.fan_out, |chunk| match DbPool::from_config(cfg) {
        Ok(mut pool) => chunk
            .iter()
            .map(|g| (g.clone(), process_group(&mut pool.conn, cfg, enricher, g)))
            .collect(),
        Err(e) => {
            let msg = e.to_string();
            chunk
                .iter()
                .map(|g| (g.clone(), Err(AppError::Other(format!("worker connection: {msg}")))))
                .collect()
        }
    })
}

/// Claim one batch of touches and apply it.
///
/// A failing group is logged and counted, never retried here: its touch
/// is already gone, so it stays stale until the next write touches it.
pub fn run_batch(pool: &mut DbPool, cfg: &Config) -> AppResult<BatchReport> {
    let retry = RetryPolicy::from_config(cfg);

    let touches = with_retry(retry, "claim_batch", || {
        TouchQueue::claim_batch(&mut pool.conn, cfg.batch_limit)
    })?;
    let groups = group_touches(&touches);

    let mut report = BatchReport {
        claimed: touches.len(),
        groups: groups.len(),
        ..Default::default()
    };

    if groups.is_empty() {
        tracing::info!("no pending touches");
        return Ok(report);
    }

    let enricher = FinanceEnricher::new(retry);

    let results: Vec<GroupResult> = if cfg.fan_out > 1 && groups.len() > 1 {
        process_parallel(cfg, &enricher, &groups)
    } else {
        groups
            .iter()
            .map(|g| (g.clone(), process_group(&mut pool.conn, cfg, &enricher, g)))
            .collect()
    };

    for (group, result) in results {
        let target = format!("{}/{}", group.owner, group.day);
        match result {
            Ok(outcome) => {
                report.applied += 1;
                report.kpi_rows += outcome.kpi_rows;
                tracing::info!(
                    owner = %group.owner,
                    day = %group.day,
                    touches = group.touch_count,
                    rollups = outcome.rollups,
                    kpi_rows = outcome.kpi_rows,
                    "group applied"
                );
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(
                    owner = %group.owner,
                    day = %group.day,
                    fatal_input = e.is_fatal_input(),
                    error = %e,
                    "group failed, left stale until next touch"
                );
                ttlog_quiet(&pool.conn, "recompute_failed", &target, &e.to_string());
            }
        }
    }

    ttlog_quiet(
        &pool.conn,
        "batch",
        "",
        &format!(
            "claimed={} groups={} applied={} failed={} kpi_rows={}",
            report.claimed, report.groups, report.applied, report.failed, report.kpi_rows
        ),
    );

    Ok(report)
}
