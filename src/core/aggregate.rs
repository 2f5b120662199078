//! Per-job labour totals from the day's rollups.

use crate::models::kpi::LabourTotals;
use crate::models::rollup::TimesheetRollup;
use crate::utils::time::round_cents;
use std::collections::{BTreeMap, HashMap};

/// Minutes above `threshold`; a threshold of 0 means OT is not configured.
pub fn overtime_minutes(paid_minutes: i64, threshold: i64) -> i64 {
    if threshold <= 0 {
        return 0;
    }
    (paid_minutes - threshold).max(0)
}

/// Sum rollups by job. An employee without a rate contributes minutes
/// but no cost.
pub fn aggregate_job_day(
    rollups: &[TimesheetRollup],
    rates: &HashMap<String, f64>,
    ot_threshold_minutes: i64,
) -> BTreeMap<i64, LabourTotals> {
    let mut out: BTreeMap<i64, LabourTotals> = BTreeMap::new();

    for r in rollups {
        let totals = out.entry(r.job_ref).or_default();
        totals.paid_minutes += r.paid_minutes;
        totals.drive_minutes += r.drive_minutes;

        match rates.get(&r.employee_name) {
            Some(rate) => totals.labour_cost += r.paid_minutes as f64 / 60.0 * rate,
            None => tracing::debug!(
                employee = %r.employee_name,
                job_no = r.job_ref,
                "no hourly rate, labour cost counted as 0"
            ),
        }
    }

    for totals in out.values_mut() {
        totals.labour_cost = round_cents(totals.labour_cost);
        totals.ot_minutes = overtime_minutes(totals.paid_minutes, ot_threshold_minutes);
    }

    out
}
