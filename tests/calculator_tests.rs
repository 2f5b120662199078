use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use jobkpi::core::aggregate::{aggregate_job_day, overtime_minutes};
use jobkpi::core::calculator::attribution::majority_job;
use jobkpi::core::calculator::intervals::reconstruct_intervals;
use jobkpi::core::calculator::timesheet::build_rollups;
use jobkpi::core::calculator::window::DayWindow;
use jobkpi::models::event::TimeEvent;
use jobkpi::models::event_type::{Category, TimeEventKind};
use jobkpi::models::job::{JobRef, UNASSIGNED_JOB_NO};
use jobkpi::models::owner::Owner;
use jobkpi::models::rollup::paid_minutes;
use std::collections::HashMap;

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn ev(employee: &str, kind: TimeEventKind, at: &str, job: Option<&str>) -> TimeEvent {
    TimeEvent {
        id: 0,
        owner: "1".to_string(),
        employee_name: employee.to_string(),
        kind,
        ts: ts(at),
        job_ref: job.and_then(JobRef::parse),
    }
}

fn numeric_jobs(nos: &[i64]) -> HashMap<JobRef, i64> {
    nos.iter().map(|n| (JobRef::No(*n), *n)).collect()
}

#[test]
fn test_stop_closes_most_recent_start_of_same_category() {
    let events = vec![
        ev("Mike", TimeEventKind::ClockIn, "2025-03-10T08:00:00Z", None),
        ev("Mike", TimeEventKind::DriveStart, "2025-03-10T08:10:00Z", None),
        ev("Mike", TimeEventKind::BreakStart, "2025-03-10T08:30:00Z", None),
        ev("Mike", TimeEventKind::DriveStop, "2025-03-10T08:40:00Z", None),
        ev("Mike", TimeEventKind::BreakStop, "2025-03-10T08:45:00Z", None),
        ev("Mike", TimeEventKind::ClockOut, "2025-03-10T09:00:00Z", None),
    ];

    let intervals = reconstruct_intervals(&events);
    assert_eq!(intervals.len(), 3);

    let drive = intervals.iter().find(|i| i.category == Category::Drive).unwrap();
    assert_eq!(drive.start, ts("2025-03-10T08:10:00Z"));
    assert_eq!(drive.end, ts("2025-03-10T08:40:00Z"));
}

#[test]
fn test_unmatched_stop_and_open_start_are_ignored() {
    let events = vec![
        ev("Mike", TimeEventKind::ClockOut, "2025-03-10T07:00:00Z", None),
        ev("Mike", TimeEventKind::ClockIn, "2025-03-10T08:00:00Z", None),
        ev("Mike", TimeEventKind::ClockOut, "2025-03-10T10:00:00Z", None),
        ev("Mike", TimeEventKind::BreakStart, "2025-03-10T11:00:00Z", None),
    ];

    let intervals = reconstruct_intervals(&events);
    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].category, Category::Clock);
}

#[test]
fn test_cross_midnight_shift_is_split_between_days() {
    let events = vec![
        ev("Nina", TimeEventKind::ClockIn, "2025-03-10T23:00:00Z", None),
        ev("Nina", TimeEventKind::ClockOut, "2025-03-11T07:00:00Z", None),
    ];
    let intervals = reconstruct_intervals(&events);

    let first = DayWindow::new(Tz::UTC, day("2025-03-10")).unwrap();
    let second = DayWindow::new(Tz::UTC, day("2025-03-11")).unwrap();

    assert_eq!(first.sum_minutes(&intervals).shift, 60);
    assert_eq!(second.sum_minutes(&intervals).shift, 420);
}

#[test]
fn test_seconds_are_summed_before_truncating() {
    let events = vec![
        ev("Mike", TimeEventKind::ClockIn, "2025-03-10T08:00:30Z", None),
        ev("Mike", TimeEventKind::ClockOut, "2025-03-10T08:01:00Z", None),
        ev("Mike", TimeEventKind::ClockIn, "2025-03-10T09:00:00Z", None),
        ev("Mike", TimeEventKind::ClockOut, "2025-03-10T09:00:30Z", None),
    ];
    let window = DayWindow::new(Tz::UTC, day("2025-03-10")).unwrap();

    assert_eq!(window.sum_minutes(&reconstruct_intervals(&events)).shift, 1);
}

#[test]
fn test_day_window_follows_owner_timezone() {
    let window = DayWindow::new(Tz::America__Toronto, day("2025-03-10")).unwrap();
    assert_eq!(window.start, ts("2025-03-10T04:00:00Z"));
    assert_eq!(window.end, ts("2025-03-11T04:00:00Z"));

    let (from, to) = window.fetch_range();
    assert_eq!(from, ts("2025-03-09T16:00:00Z"));
    assert_eq!(to, ts("2025-03-11T16:00:00Z"));
}

#[test]
fn test_dst_spring_forward_day_is_23_hours() {
    let window = DayWindow::new(Tz::America__Toronto, day("2025-03-09")).unwrap();
    assert_eq!((window.end - window.start).num_hours(), 23);
}

#[test]
fn test_midnight_in_dst_gap_starts_at_first_valid_instant() {
    // Santiago skips 00:00-01:00 when DST starts.
    let window = DayWindow::new(Tz::America__Santiago, day("2024-09-08")).unwrap();
    assert_eq!(window.start, ts("2024-09-08T04:00:00Z"));
}

#[test]
fn test_majority_vote_picks_most_frequent_job() {
    let events = vec![
        ev("Mike", TimeEventKind::ClockIn, "2025-03-10T08:00:00Z", Some("8")),
        ev("Mike", TimeEventKind::DriveStart, "2025-03-10T09:00:00Z", Some("9")),
        ev("Mike", TimeEventKind::DriveStop, "2025-03-10T09:30:00Z", Some("9")),
        ev("Mike", TimeEventKind::ClockOut, "2025-03-10T16:00:00Z", Some("9")),
    ];
    let window = DayWindow::new(Tz::UTC, day("2025-03-10")).unwrap();

    assert_eq!(majority_job(&events, &window, &numeric_jobs(&[8, 9])), 9);
}

#[test]
fn test_majority_vote_tie_goes_to_first_seen() {
    let events = vec![
        ev("Mike", TimeEventKind::ClockIn, "2025-03-10T08:00:00Z", Some("12")),
        ev("Mike", TimeEventKind::ClockOut, "2025-03-10T16:00:00Z", Some("7")),
    ];
    let window = DayWindow::new(Tz::UTC, day("2025-03-10")).unwrap();

    assert_eq!(majority_job(&events, &window, &numeric_jobs(&[7, 12])), 12);
}

#[test]
fn test_majority_vote_falls_back_to_window_then_unassigned() {
    let window = DayWindow::new(Tz::UTC, day("2025-03-11")).unwrap();

    // Only the clock-in (previous evening) carries a job.
    let tagged_before = vec![
        ev("Nina", TimeEventKind::ClockIn, "2025-03-10T23:00:00Z", Some("4")),
        ev("Nina", TimeEventKind::ClockOut, "2025-03-11T07:00:00Z", None),
    ];
    assert_eq!(majority_job(&tagged_before, &window, &numeric_jobs(&[4])), 4);

    let untagged = vec![
        ev("Nina", TimeEventKind::ClockIn, "2025-03-11T08:00:00Z", None),
        ev("Nina", TimeEventKind::ClockOut, "2025-03-11T09:00:00Z", None),
    ];
    assert_eq!(majority_job(&untagged, &window, &HashMap::new()), UNASSIGNED_JOB_NO);
}

#[test]
fn test_paid_minutes_never_negative() {
    assert_eq!(paid_minutes(510, 30), 480);
    assert_eq!(paid_minutes(20, 45), 0);
    assert_eq!(paid_minutes(0, 0), 0);
}

#[test]
fn test_build_rollups_mike_example() {
    let owner = Owner::parse("1").unwrap();
    let events = vec![
        ev("Mike", TimeEventKind::ClockIn, "2025-03-10T08:00:00Z", Some("8")),
        ev("Mike", TimeEventKind::BreakStart, "2025-03-10T12:00:00Z", Some("8")),
        ev("Mike", TimeEventKind::BreakStop, "2025-03-10T12:30:00Z", Some("8")),
        ev("Mike", TimeEventKind::ClockOut, "2025-03-10T16:30:00Z", Some("8")),
        ev("Zoe", TimeEventKind::ClockIn, "2025-03-09T08:00:00Z", Some("8")),
        ev("Zoe", TimeEventKind::ClockOut, "2025-03-09T12:00:00Z", Some("8")),
    ];
    let window = DayWindow::new(Tz::UTC, day("2025-03-10")).unwrap();

    let rollups = build_rollups(&owner, "2025-03-10", &window, &events, &numeric_jobs(&[8]));

    // Zoe worked the day before only.
    assert_eq!(rollups.len(), 1);
    let r = &rollups[0];
    assert_eq!(r.employee_name, "Mike");
    assert_eq!(r.job_ref, 8);
    assert_eq!(r.shift_minutes, 510);
    assert_eq!(r.break_minutes, 30);
    assert_eq!(r.paid_minutes, 480);
}

#[test]
fn test_aggregate_costs_overtime_and_missing_rates() {
    let owner = Owner::parse("1").unwrap();
    let window = DayWindow::new(Tz::UTC, day("2025-03-10")).unwrap();
    let events = vec![
        ev("Ana", TimeEventKind::ClockIn, "2025-03-10T06:00:00Z", Some("8")),
        ev("Ana", TimeEventKind::ClockOut, "2025-03-10T16:00:00Z", Some("8")),
        ev("Bo", TimeEventKind::ClockIn, "2025-03-10T08:00:00Z", Some("8")),
        ev("Bo", TimeEventKind::DriveStart, "2025-03-10T08:00:00Z", Some("8")),
        ev("Bo", TimeEventKind::DriveStop, "2025-03-10T08:45:00Z", Some("8")),
        ev("Bo", TimeEventKind::ClockOut, "2025-03-10T10:00:00Z", Some("8")),
    ];
    let rollups = build_rollups(&owner, "2025-03-10", &window, &events, &numeric_jobs(&[8]));

    let rates = HashMap::from([("Ana".to_string(), 30.0)]);
    let totals = aggregate_job_day(&rollups, &rates, 480);

    let job = totals.get(&8).unwrap();
    assert_eq!(job.paid_minutes, 600 + 120);
    assert_eq!(job.drive_minutes, 45);
    // Bo has no rate: minutes count, cost does not.
    assert_eq!(job.labour_cost, 300.0);
    assert_eq!(job.ot_minutes, 720 - 480);
}

#[test]
fn test_overtime_requires_threshold() {
    assert_eq!(overtime_minutes(600, 0), 0);
    assert_eq!(overtime_minutes(600, 480), 120);
    assert_eq!(overtime_minutes(400, 480), 0);
}
