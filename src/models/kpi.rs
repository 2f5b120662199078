use serde::Serialize;

/// Labour totals for one job on one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabourTotals {
    pub paid_minutes: i64,
    pub drive_minutes: i64,
    pub labour_cost: f64,
    pub ot_minutes: i64,
}

/// Ledger-derived metrics for one job on one day. `None` means the
/// backing relation is not available in this deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinanceKpis {
    pub revenue: Option<f64>,
    pub cogs: Option<f64>,
    pub gross_profit: Option<f64>,
    pub gross_margin_pct: Option<f64>,
    pub change_order_amount: Option<f64>,
    pub holdback_amount: Option<f64>,
    pub ar_total: Option<f64>,
    pub ap_total: Option<f64>,
    pub estimate_revenue: Option<f64>,
    pub estimate_cogs: Option<f64>,
    pub slippage: Option<f64>,
}

/// Final merged row (one `job_kpi_daily` row).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobKpiDaily {
    pub owner: String,
    pub day: String,
    pub job_ref: i64,
    pub paid_minutes: Option<i64>,
    pub drive_minutes: Option<i64>,
    pub labour_cost: Option<f64>,
    pub ot_minutes: Option<i64>,
    pub revenue: Option<f64>,
    pub cogs: Option<f64>,
    pub gross_profit: Option<f64>,
    pub gross_margin_pct: Option<f64>,
    pub change_order_amount: Option<f64>,
    pub holdback_amount: Option<f64>,
    pub ar_total: Option<f64>,
    pub ap_total: Option<f64>,
    pub slippage: Option<f64>,
}
