use serde::Serialize;

/// Minutes for one employee on one job on one day (one `timesheet_rollups` row).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimesheetRollup {
    pub owner: String,
    pub day: String,
    pub employee_name: String,
    pub job_ref: i64,
    pub shift_minutes: i64,
    pub break_minutes: i64,
    pub drive_minutes: i64,
    pub paid_minutes: i64,
}

/// `max(0, shift − break)`; paid-break policy is applied downstream by payroll.
pub fn paid_minutes(shift_minutes: i64, break_minutes: i64) -> i64 {
    (shift_minutes - break_minutes).max(0)
}
