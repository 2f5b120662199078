use super::attribution::majority_job;
use super::intervals::reconstruct_intervals;
use super::window::DayWindow;
use crate::models::event::TimeEvent;
use crate::models::job::JobRef;
use crate::models::owner::Owner;
use crate::models::rollup::{TimesheetRollup, paid_minutes};
use std::collections::HashMap;

/// One rollup per employee with any minutes inside the day.
///
/// `events` must be ordered by employee, then timestamp (as
/// `load_time_events` returns them).
pub fn build_rollups(
    owner: &Owner,
    day: &str,
    window: &DayWindow,
    events: &[TimeEvent],
    jobs: &HashMap<JobRef, i64>,
) -> Vec<TimesheetRollup> {
    let mut out = Vec::new();

    for emp_events in events.chunk_by(|a, b| a.employee_name == b.employee_name) {
        let intervals = reconstruct_intervals(emp_events);
        let minutes = window.sum_minutes(&intervals);
        if minutes.is_empty() {
            continue;
        }

        out.push(TimesheetRollup {
            owner: owner.to_string(),
            day: day.to_string(),
            employee_name: emp_events[0].employee_name.clone(),
            job_ref: majority_job(emp_events, window, jobs),
            shift_minutes: minutes.shift,
            break_minutes: minutes.breaks,
            drive_minutes: minutes.drive,
            paid_minutes: paid_minutes(minutes.shift, minutes.breaks),
        });
    }

    out
}
