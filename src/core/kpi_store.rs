//! Group-wise merge into job_kpi_daily.

use crate::errors::AppResult;
use crate::models::kpi::{FinanceKpis, LabourTotals};
use crate::models::owner::Owner;
use chrono::Utc;
use rusqlite::{Connection, named_params};

/// Upsert the KPI row for (owner, day, job).
///
/// The merge is per group of columns, not per column: when `labour` is
/// given every time column is overwritten, and when `finance` is given
/// every finance column is overwritten, NULLs included, so a metric that
/// became unavailable does not keep its previous value. A group that is
/// `None` was not computed by this pass and keeps what is stored.
pub fn upsert_kpi(
    conn: &Connection,
    owner: &Owner,
    day: &str,
    job_no: i64,
    labour: Option<&LabourTotals>,
    finance: Option<&FinanceKpis>,
) -> AppResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO job_kpi_daily (
             owner, day, job_ref,
             paid_minutes, drive_minutes, labour_cost, ot_minutes,
             revenue, cogs, gross_profit, gross_margin_pct, change_order_amount,
             holdback_amount, ar_total, ap_total, slippage, updated_at)
         VALUES (:owner, :day, :job_ref,
                 :paid_minutes, :drive_minutes, :labour_cost, :ot_minutes,
                 :revenue, :cogs, :gross_profit, :gross_margin_pct, :change_order_amount,
                 :holdback_amount, :ar_total, :ap_total, :slippage, :updated_at)
         ON CONFLICT(owner, day, job_ref) DO UPDATE SET
             paid_minutes        = CASE WHEN :has_labour  THEN excluded.paid_minutes        ELSE job_kpi_daily.paid_minutes        END,
             drive_minutes       = CASE WHEN :has_labour  THEN excluded.drive_minutes       ELSE job_kpi_daily.drive_minutes       END,
             labour_cost         = CASE WHEN :has_labour  THEN excluded.labour_cost         ELSE job_kpi_daily.labour_cost         END,
             ot_minutes          = CASE WHEN :has_labour  THEN excluded.ot_minutes          ELSE job_kpi_daily.ot_minutes          END,
             revenue             = CASE WHEN :has_finance THEN excluded.revenue             ELSE job_kpi_daily.revenue             END,
             cogs                = CASE WHEN :has_finance THEN excluded.cogs                ELSE job_kpi_daily.cogs                END,
             gross_profit        = CASE WHEN :has_finance THEN excluded.gross_profit        ELSE job_kpi_daily.gross_profit        END,
             gross_margin_pct    = CASE WHEN :has_finance THEN excluded.gross_margin_pct    ELSE job_kpi_daily.gross_margin_pct    END,
             change_order_amount = CASE WHEN :has_finance THEN excluded.change_order_amount ELSE job_kpi_daily.change_order_amount END,
             holdback_amount     = CASE WHEN :has_finance THEN excluded.holdback_amount     ELSE job_kpi_daily.holdback_amount     END,
             ar_total            = CASE WHEN :has_finance THEN excluded.ar_total            ELSE job_kpi_daily.ar_total            END,
             ap_total            = CASE WHEN :has_finance THEN excluded.ap_total            ELSE job_kpi_daily.ap_total            END,
             slippage            = CASE WHEN :has_finance THEN excluded.slippage            ELSE job_kpi_daily.slippage            END,
             updated_at          = excluded.updated_at",
    )?;

    let f = finance.cloned().unwrap_or_default();

    stmt.execute(named_params! {
        ":owner": owner.as_str(),
        ":day": day,
        ":job_ref": job_no,
        ":paid_minutes": labour.map(|l| l.paid_minutes),
        ":drive_minutes": labour.map(|l| l.drive_minutes),
        ":labour_cost": labour.map(|l| l.labour_cost),
        ":ot_minutes": labour.map(|l| l.ot_minutes),
        ":revenue": f.revenue,
        ":cogs": f.cogs,
        ":gross_profit": f.gross_profit,
        ":gross_margin_pct": f.gross_margin_pct,
        ":change_order_amount": f.change_order_amount,
        ":holdback_amount": f.holdback_amount,
        ":ar_total": f.ar_total,
        ":ap_total": f.ap_total,
        ":slippage": f.slippage,
        ":updated_at": Utc::now().to_rfc3339(),
        ":has_labour": labour.is_some(),
        ":has_finance": finance.is_some(),
    })?;
    Ok(())
}
