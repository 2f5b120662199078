mod common;
use chrono::NaiveDate;
use common::*;
use jobkpi::core::finance::FinanceEnricher;
use jobkpi::core::kpi_store::upsert_kpi;
use jobkpi::core::touch_queue::{TouchQueue, group_touches};
use jobkpi::core::worker::{GroupOutcome, fan_out, recompute_day, run_batch};
use jobkpi::db::queries::{list_kpis, list_rollups, load_kpi, set_hourly_rate, set_owner_settings};
use jobkpi::models::event_type::TimeEventKind;
use jobkpi::models::job::JobRef;
use jobkpi::models::kpi::FinanceKpis;
use jobkpi::models::owner::Owner;
use jobkpi::errors::AppError;
use jobkpi::models::touch::{Touch, TouchGroup};

const DAY: &str = "2025-03-10";

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn owner(s: &str) -> Owner {
    Owner::parse(s).unwrap()
}

fn raw_touch(conn: &rusqlite::Connection, owner: &str, job: Option<&str>, day: &str) {
    conn.execute(
        "INSERT INTO touches (owner, job_ref, day, created_at) VALUES (?1, ?2, ?3, '2025-03-10T00:00:00Z')",
        rusqlite::params![owner, job, day],
    )
    .unwrap();
}

#[test]
fn test_mike_day_end_to_end() {
    let (mut pool, cfg) = open_test_db("worker_mike");
    let o = owner("1");
    punch_mike_day(&pool.conn, "1");
    set_hourly_rate(&pool.conn, &o, "Mike", 25.0).unwrap();
    TouchQueue::enqueue(&pool.conn, &o, Some("8"), day(DAY)).unwrap();

    let report = run_batch(&mut pool, &cfg).unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.failed, 0);

    let rollups = list_rollups(&pool.conn, &o, DAY, DAY).unwrap();
    assert_eq!(rollups.len(), 1);
    assert_eq!(rollups[0].job_ref, 8);
    assert_eq!(rollups[0].shift_minutes, 510);
    assert_eq!(rollups[0].break_minutes, 30);
    assert_eq!(rollups[0].paid_minutes, 480);

    let kpi = load_kpi(&pool.conn, &o, DAY, 8).unwrap().unwrap();
    assert_eq!(kpi.paid_minutes, Some(480));
    assert_eq!(kpi.labour_cost, Some(200.0));
    assert_eq!(kpi.ot_minutes, Some(0));
    // No ledger relations exist in this store.
    assert_eq!(kpi.revenue, None);
    assert_eq!(kpi.gross_profit, None);
}

#[test]
fn test_recompute_is_idempotent() {
    let (mut pool, cfg) = open_test_db("worker_idempotent");
    let o = owner("1");
    punch_mike_day(&pool.conn, "1");
    set_hourly_rate(&pool.conn, &o, "Mike", 25.0).unwrap();
    let enricher = FinanceEnricher::default();

    recompute_day(&mut pool.conn, &cfg, &enricher, &o, day(DAY), &[]).unwrap();
    let rollups = list_rollups(&pool.conn, &o, DAY, DAY).unwrap();
    let kpis = list_kpis(&pool.conn, &o, DAY, DAY).unwrap();

    recompute_day(&mut pool.conn, &cfg, &enricher, &o, day(DAY), &[]).unwrap();
    assert_eq!(list_rollups(&pool.conn, &o, DAY, DAY).unwrap(), rollups);
    assert_eq!(list_kpis(&pool.conn, &o, DAY, DAY).unwrap(), kpis);
}

#[test]
fn test_duplicate_touches_coalesce_into_one_group() {
    let (mut pool, cfg) = open_test_db("worker_coalesce");
    let o = owner("1");
    punch_mike_day(&pool.conn, "1");
    for _ in 0..3 {
        TouchQueue::enqueue(&pool.conn, &o, Some("8"), day(DAY)).unwrap();
    }

    let report = run_batch(&mut pool, &cfg).unwrap();
    assert_eq!(report.claimed, 3);
    assert_eq!(report.groups, 1);
    assert_eq!(report.applied, 1);
    assert_eq!(TouchQueue::pending(&pool.conn).unwrap(), 0);
}

#[test]
fn test_group_touches_keeps_first_seen_order() {
    let t = |id, owner: &str, job: Option<&str>, day: &str| Touch {
        id,
        owner: owner.to_string(),
        job_ref: job.map(str::to_string),
        day: day.to_string(),
    };
    let touches = vec![
        t(1, "2", None, "2025-03-11"),
        t(2, "1", Some("8"), "2025-03-10"),
        t(3, "2", Some("deck"), "2025-03-11"),
        t(4, "1", Some("8"), "2025-03-10"),
        t(5, "1", Some("9"), "2025-03-10"),
    ];

    let groups = group_touches(&touches);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].owner, "2");
    assert_eq!(groups[0].job_refs, vec!["deck".to_string()]);
    assert_eq!(groups[1].touch_count, 3);
    assert_eq!(groups[1].job_refs, vec!["8".to_string(), "9".to_string()]);
}

#[test]
fn test_batch_limit_leaves_the_rest_pending() {
    let (mut pool, mut cfg) = open_test_db("worker_limit");
    let o = owner("1");
    for d in ["2025-03-10", "2025-03-11", "2025-03-12"] {
        TouchQueue::enqueue(&pool.conn, &o, None, day(d)).unwrap();
    }
    cfg.batch_limit = 2;

    let report = run_batch(&mut pool, &cfg).unwrap();
    assert_eq!(report.claimed, 2);
    assert_eq!(TouchQueue::pending(&pool.conn).unwrap(), 1);
}

#[test]
fn test_bad_group_does_not_block_the_batch() {
    let (mut pool, cfg) = open_test_db("worker_isolation");
    punch_mike_day(&pool.conn, "1");
    raw_touch(&pool.conn, "not an owner!", None, DAY);
    raw_touch(&pool.conn, "1", None, "2025-13-45");
    raw_touch(&pool.conn, "1", Some("8"), DAY);

    let report = run_batch(&mut pool, &cfg).unwrap();
    assert_eq!(report.groups, 3);
    assert_eq!(report.applied, 1);
    assert_eq!(report.failed, 2);

    assert!(load_kpi(&pool.conn, &owner("1"), DAY, 8).unwrap().is_some());

    let failures: i64 = pool
        .conn
        .query_row("SELECT COUNT(*) FROM log WHERE operation = 'recompute_failed'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(failures, 2);
}

#[test]
fn test_cross_midnight_shift_feeds_both_days() {
    let (mut pool, cfg) = open_test_db("worker_midnight");
    let o = owner("1");
    punch(&pool.conn, "1", "Nina", TimeEventKind::ClockIn, "2025-03-10T23:00:00Z", Some("5"));
    punch(&pool.conn, "1", "Nina", TimeEventKind::ClockOut, "2025-03-11T07:00:00Z", Some("5"));
    let enricher = FinanceEnricher::default();

    recompute_day(&mut pool.conn, &cfg, &enricher, &o, day("2025-03-10"), &[]).unwrap();
    recompute_day(&mut pool.conn, &cfg, &enricher, &o, day("2025-03-11"), &[]).unwrap();

    let rollups = list_rollups(&pool.conn, &o, "2025-03-10", "2025-03-11").unwrap();
    let minutes: Vec<i64> = rollups.iter().map(|r| r.shift_minutes).collect();
    assert_eq!(minutes, vec![60, 420]);
}

#[test]
fn test_owner_timezone_defines_the_day() {
    let (mut pool, cfg) = open_test_db("worker_timezone");
    let o = owner("1");
    set_owner_settings(&pool.conn, &o, Some("America/Toronto"), None).unwrap();
    // 08:00-22:00 local.
    punch(&pool.conn, "1", "Ana", TimeEventKind::ClockIn, "2025-03-10T12:00:00Z", Some("3"));
    punch(&pool.conn, "1", "Ana", TimeEventKind::ClockOut, "2025-03-11T02:00:00Z", Some("3"));

    recompute_day(&mut pool.conn, &cfg, &FinanceEnricher::default(), &o, day(DAY), &[]).unwrap();

    let rollups = list_rollups(&pool.conn, &o, DAY, DAY).unwrap();
    assert_eq!(rollups.len(), 1);
    assert_eq!(rollups[0].shift_minutes, 840);
}

#[test]
fn test_overtime_uses_owner_threshold() {
    let (mut pool, cfg) = open_test_db("worker_overtime");
    let o = owner("1");
    set_owner_settings(&pool.conn, &o, None, Some(450)).unwrap();
    punch_mike_day(&pool.conn, "1");

    recompute_day(&mut pool.conn, &cfg, &FinanceEnricher::default(), &o, day(DAY), &[]).unwrap();

    let kpi = load_kpi(&pool.conn, &o, DAY, 8).unwrap().unwrap();
    assert_eq!(kpi.ot_minutes, Some(30));
}

#[test]
fn test_named_job_refs_are_allocated() {
    let (mut pool, cfg) = open_test_db("worker_named_jobs");
    let o = owner("1");
    punch(&pool.conn, "1", "Mike", TimeEventKind::ClockIn, "2025-03-10T08:00:00Z", Some("Smith Kitchen"));
    punch(&pool.conn, "1", "Mike", TimeEventKind::ClockOut, "2025-03-10T10:00:00Z", Some("smith kitchen"));

    recompute_day(&mut pool.conn, &cfg, &FinanceEnricher::default(), &o, day(DAY), &[]).unwrap();

    assert_eq!(count_rows(&pool.conn, "jobs"), 1);
    let rollups = list_rollups(&pool.conn, &o, DAY, DAY).unwrap();
    assert_eq!(rollups[0].job_ref, 1);
}

#[test]
fn test_untagged_minutes_go_to_unassigned_job() {
    let (mut pool, cfg) = open_test_db("worker_unassigned");
    let o = owner("1");
    punch(&pool.conn, "1", "Mike", TimeEventKind::ClockIn, "2025-03-10T08:00:00Z", None);
    punch(&pool.conn, "1", "Mike", TimeEventKind::ClockOut, "2025-03-10T09:00:00Z", None);

    recompute_day(&mut pool.conn, &cfg, &FinanceEnricher::default(), &o, day(DAY), &[]).unwrap();

    let kpi = load_kpi(&pool.conn, &o, DAY, 0).unwrap().unwrap();
    assert_eq!(kpi.paid_minutes, Some(60));
    assert_eq!(kpi.revenue, None);
}

#[test]
fn test_moved_punches_zero_the_old_job() {
    let (mut pool, cfg) = open_test_db("worker_moved_job");
    let o = owner("1");
    punch_mike_day(&pool.conn, "1");
    let enricher = FinanceEnricher::default();
    recompute_day(&mut pool.conn, &cfg, &enricher, &o, day(DAY), &[]).unwrap();

    pool.conn
        .execute("UPDATE time_events SET job_ref = '9' WHERE employee_name = 'Mike'", [])
        .unwrap();
    recompute_day(&mut pool.conn, &cfg, &enricher, &o, day(DAY), &[]).unwrap();

    let rollups = list_rollups(&pool.conn, &o, DAY, DAY).unwrap();
    assert_eq!(rollups.len(), 1);
    assert_eq!(rollups[0].job_ref, 9);

    let old = load_kpi(&pool.conn, &o, DAY, 8).unwrap().unwrap();
    assert_eq!(old.paid_minutes, Some(0));
    assert_eq!(old.labour_cost, Some(0.0));
    let new = load_kpi(&pool.conn, &o, DAY, 9).unwrap().unwrap();
    assert_eq!(new.paid_minutes, Some(480));
}

#[test]
fn test_finance_only_update_keeps_time_metrics() {
    let (mut pool, cfg) = open_test_db("worker_field_merge");
    let o = owner("1");
    punch_mike_day(&pool.conn, "1");
    recompute_day(&mut pool.conn, &cfg, &FinanceEnricher::default(), &o, day(DAY), &[]).unwrap();

    let finance = FinanceKpis {
        revenue: Some(900.0),
        ..Default::default()
    };
    upsert_kpi(&pool.conn, &o, DAY, 8, None, Some(&finance)).unwrap();

    let kpi = load_kpi(&pool.conn, &o, DAY, 8).unwrap().unwrap();
    assert_eq!(kpi.paid_minutes, Some(480));
    assert_eq!(kpi.revenue, Some(900.0));
}

#[test]
fn test_touched_job_without_time_gets_finance_row() {
    let (mut pool, cfg) = open_test_db("worker_finance_touch");
    let o = owner("1");
    pool.conn
        .execute_batch(
            "CREATE TABLE revenue_entries (owner TEXT, job_no INTEGER, occurred_on TEXT, amount REAL);
             INSERT INTO revenue_entries VALUES ('1', 12, '2025-03-10', 1500);",
        )
        .unwrap();
    TouchQueue::enqueue(&pool.conn, &o, Some("12"), day(DAY)).unwrap();

    let report = run_batch(&mut pool, &cfg).unwrap();
    assert_eq!(report.kpi_rows, 1);

    let kpi = load_kpi(&pool.conn, &o, DAY, 12).unwrap().unwrap();
    assert_eq!(kpi.revenue, Some(1500.0));
    assert_eq!(kpi.paid_minutes, None);
}

#[test]
fn test_fan_out_processes_every_group() {
    let (mut pool, mut cfg) = open_test_db("worker_fan_out");
    for o in ["1", "2", "3", "4"] {
        punch_mike_day(&pool.conn, o);
        TouchQueue::enqueue(&pool.conn, &owner(o), Some("8"), day(DAY)).unwrap();
    }
    cfg.fan_out = 3;

    let report = run_batch(&mut pool, &cfg).unwrap();
    assert_eq!(report.groups, 4);
    assert_eq!(report.applied, 4);
    assert_eq!(count_rows(&pool.conn, "job_kpi_daily"), 4);
}

#[test]
fn test_finance_recompute_clears_derived_metrics() {
    let (mut pool, cfg) = open_test_db("worker_finance_cleared");
    let o = owner("1");
    punch_mike_day(&pool.conn, "1");
    pool.conn
        .execute_batch(
            "CREATE TABLE revenue_entries (owner TEXT, job_no INTEGER, occurred_on TEXT, amount REAL);
             CREATE TABLE expenses (owner TEXT, job_no INTEGER, occurred_on TEXT, category TEXT, amount REAL);
             INSERT INTO revenue_entries VALUES ('1', 8, '2025-03-10', 100);
             INSERT INTO expenses VALUES ('1', 8, '2025-03-10', 'materials', 60);",
        )
        .unwrap();
    let enricher = FinanceEnricher::default();
    let touched = [JobRef::No(8)];

    recompute_day(&mut pool.conn, &cfg, &enricher, &o, day(DAY), &touched).unwrap();
    let before = load_kpi(&pool.conn, &o, DAY, 8).unwrap().unwrap();
    assert_eq!(before.gross_margin_pct, Some(40.0));

    pool.conn.execute("DELETE FROM revenue_entries", []).unwrap();
    recompute_day(&mut pool.conn, &cfg, &enricher, &o, day(DAY), &touched).unwrap();

    let after = load_kpi(&pool.conn, &o, DAY, 8).unwrap().unwrap();
    assert_eq!(after.revenue, Some(0.0));
    assert_eq!(after.gross_profit, Some(-60.0));
    // Zero revenue has no margin; the old 40% must not survive.
    assert_eq!(after.gross_margin_pct, None);
    assert_eq!(after.paid_minutes, Some(480));
}

fn group(owner: &str) -> TouchGroup {
    TouchGroup {
        owner: owner.to_string(),
        day: DAY.to_string(),
        job_refs: Vec::new(),
        touch_count: 1,
    }
}

#[test]
fn test_panicked_worker_groups_count_as_failed() {
    let groups: Vec<TouchGroup> = ["1", "2", "3", "4"].iter().map(|o| group(o)).collect();

    let results = fan_out(&groups, 2, |chunk| {
        if chunk.iter().any(|g| g.owner == "3") {
            panic!("worker blew up");
        }
        chunk.iter().map(|g| (g.clone(), Ok(GroupOutcome::default()))).collect()
    });

    assert_eq!(results.len(), 4);
    let mut failed: Vec<&str> = results
        .iter()
        .filter(|(_, r)| r.is_err())
        .map(|(g, _)| g.owner.as_str())
        .collect();
    failed.sort();
    assert_eq!(failed, vec!["3", "4"]);
    assert!(
        results
            .iter()
            .filter_map(|(_, r)| r.as_ref().err())
            .all(|e| matches!(e, AppError::Other(msg) if msg.contains("panicked")))
    );
}

#[test]
fn test_fan_out_caps_workers_at_group_count() {
    let groups = vec![group("1")];

    let results = fan_out(&groups, 8, |chunk| {
        chunk.iter().map(|g| (g.clone(), Ok(GroupOutcome { rollups: 1, kpi_rows: 1 }))).collect()
    });

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0.owner, "1");
}
