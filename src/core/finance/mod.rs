//! Revenue, cost, AR/AP, holdback and slippage per job and day.

pub mod sources;

use crate::db::retry::{RetryPolicy, with_retry};
use crate::errors::AppResult;
use crate::models::kpi::FinanceKpis;
use crate::utils::time::round_cents;
use rusqlite::Connection;
use sources::{
    Candidates, FinanceQuery, cogs_sources, change_order_sources, estimate_cost_sources,
    estimate_revenue_sources, holdback_sources, payable_sources, receivable_sources,
    revenue_sources,
};

/// Raw metric values before derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FinanceInputs {
    pub revenue: Option<f64>,
    pub cogs: Option<f64>,
    pub change_orders: Option<f64>,
    pub holdback: Option<f64>,
    pub ar: Option<f64>,
    pub ap: Option<f64>,
    pub estimate_revenue: Option<f64>,
    pub estimate_cogs: Option<f64>,
}

/// Derive profit, margin and slippage. Any derived value whose inputs are
/// unavailable is unavailable too.
pub fn derive_finance(i: FinanceInputs) -> FinanceKpis {
    let gross_profit = match (i.revenue, i.cogs) {
        (Some(rev), Some(cogs)) => Some(round_cents(rev - cogs)),
        _ => None,
    };

    let gross_margin_pct = match (gross_profit, i.revenue) {
        (Some(gp), Some(rev)) if rev > 0.0 => Some((gp / rev * 10_000.0).round() / 100.0),
        _ => None,
    };

    // Budgeted minus actual profit: a positive value is profit that leaked
    // against the estimate, a negative one is profit above budget.
    let slippage = match (i.estimate_revenue, i.estimate_cogs, gross_profit) {
        (Some(est_rev), Some(est_cogs), Some(gp)) => Some(round_cents((est_rev - est_cogs) - gp)),
        _ => None,
    };

    FinanceKpis {
        revenue: i.revenue,
        cogs: i.cogs,
        gross_profit,
        gross_margin_pct,
        change_order_amount: i.change_orders,
        holdback_amount: i.holdback,
        ar_total: i.ar,
        ap_total: i.ap,
        estimate_revenue: i.estimate_revenue,
        estimate_cogs: i.estimate_cogs,
        slippage,
    }
}

pub struct FinanceEnricher {
    revenue: Candidates,
    cogs: Candidates,
    change_orders: Candidates,
    holdback: Candidates,
    ar: Candidates,
    ap: Candidates,
    estimate_revenue: Candidates,
    estimate_cogs: Candidates,
    retry: RetryPolicy,
}

impl FinanceEnricher {
    /// The standard candidate lists.
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            revenue: revenue_sources(),
            cogs: cogs_sources(),
            change_orders: change_order_sources(),
            holdback: holdback_sources(),
            ar: receivable_sources(),
            ap: payable_sources(),
            estimate_revenue: estimate_revenue_sources(),
            estimate_cogs: estimate_cost_sources(),
            retry,
        }
    }

    /// First candidate that resolves wins. Absent relations, and any
    /// other non-transient failure, move on to the next candidate; when
    /// none resolve the metric is `None`.
    fn resolve(
        &self,
        conn: &Connection,
        metric: &'static str,
        candidates: &Candidates,
        q: &FinanceQuery<'_>,
    ) -> AppResult<Option<f64>> {
        for source in candidates {
            let relation = source.relation();

            match with_retry(self.retry, relation, || source.sum(conn, q)) {
                Ok(v) => {
                    tracing::debug!(metric, relation, job_no = q.job_no, "metric resolved");
                    return Ok(v.map(round_cents));
                }
                Err(e) if e.is_transient() => return Err(e),
                Err(e) if e.is_schema_absence() => {
                    tracing::debug!(metric, relation, "relation absent, trying next candidate");
                }
                Err(e) => {
                    tracing::warn!(metric, relation, error = %e, "candidate failed, trying next");
                }
            }
        }

        tracing::debug!(metric, job_no = q.job_no, "no candidate relation available");
        Ok(None)
    }

    pub fn inputs(&self, conn: &Connection, owner: &str, job_no: i64, day: &str) -> AppResult<FinanceInputs> {
        let q = FinanceQuery { owner, job_no, day };

        Ok(FinanceInputs {
            revenue: self.resolve(conn, "revenue", &self.revenue, &q)?,
            cogs: self.resolve(conn, "cogs", &self.cogs, &q)?,
            change_orders: self.resolve(conn, "change_orders", &self.change_orders, &q)?,
            holdback: self.resolve(conn, "holdback", &self.holdback, &q)?,
            ar: self.resolve(conn, "ar", &self.ar, &q)?,
            ap: self.resolve(conn, "ap", &self.ap, &q)?,
            estimate_revenue: self.resolve(conn, "estimate_revenue", &self.estimate_revenue, &q)?,
            estimate_cogs: self.resolve(conn, "estimate_cogs", &self.estimate_cogs, &q)?,
        })
    }

    /// Finance KPIs for one job on one day.
    pub fn compute_finance_kpis(&self, conn: &Connection, owner: &str, job_no: i64, day: &str) -> AppResult<FinanceKpis> {
        Ok(derive_finance(self.inputs(conn, owner, job_no, day)?))
    }
}

impl Default for FinanceEnricher {
    fn default() -> Self {
        Self::new(RetryPolicy::none())
    }
}
