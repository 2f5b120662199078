use super::window::DayWindow;
use crate::models::event::TimeEvent;
use crate::models::job::{JobRef, UNASSIGNED_JOB_NO};
use std::collections::HashMap;

/// The job an employee's day is charged to: the job_no tagged on most of
/// their events inside the day (ties go to the first one seen). When no
/// event inside the day carries a tag, tags anywhere in the fetch window
/// are used instead, which covers a shift opened the evening before.
///
/// This is a heuristic: an employee who splits a day across jobs has the
/// whole day charged to one of them.
pub fn majority_job(events: &[TimeEvent], window: &DayWindow, jobs: &HashMap<JobRef, i64>) -> i64 {
    let in_day = vote(events.iter().filter(|e| window.contains(e.ts)), jobs);
    in_day
        .or_else(|| vote(events.iter(), jobs))
        .unwrap_or(UNASSIGNED_JOB_NO)
}

fn vote<'a>(events: impl Iterator<Item = &'a TimeEvent>, jobs: &HashMap<JobRef, i64>) -> Option<i64> {
    // (job_no, count) in first-seen order
    let mut tally: Vec<(i64, usize)> = Vec::new();

    for job_no in events.filter_map(|e| e.job_ref.as_ref().and_then(|r| jobs.get(r))) {
        match tally.iter_mut().find(|(j, _)| j == job_no) {
            Some((_, n)) => *n += 1,
            None => tally.push((*job_no, 1)),
        }
    }

    let mut best: Option<(i64, usize)> = None;
    for (job, n) in tally {
        if best.is_none_or(|(_, b)| n > b) {
            best = Some((job, n));
        }
    }
    best.map(|(job, _)| job)
}
