//! Ledger relations a deployment may or may not have.
//!
//! Every source runs one statement bound to `:owner`, `:job_no` and
//! `:day`. A missing table or column surfaces as a schema-absence error
//! and the enricher moves on to the next candidate.

use crate::errors::AppResult;
use rusqlite::{Connection, OptionalExtension, named_params};

/// The (owner, job, day) a metric is computed for.
#[derive(Debug, Clone, Copy)]
pub struct FinanceQuery<'a> {
    pub owner: &'a str,
    pub job_no: i64,
    pub day: &'a str,
}

pub trait AmountSource: Send + Sync {
    /// Relation this source reads, for logging.
    fn relation(&self) -> &'static str;

    /// `Ok(None)` means the relation exists but holds no value for the
    /// query (e.g. no estimate valid on that day).
    fn sum(&self, conn: &Connection, q: &FinanceQuery<'_>) -> AppResult<Option<f64>>;
}

/// `SELECT COALESCE(SUM(..), 0)` over a relation: an existing relation
/// with no matching rows yields zero.
pub struct SumOf {
    pub relation: &'static str,
    pub sql: &'static str,
}

impl AmountSource for SumOf {
    fn relation(&self) -> &'static str {
        self.relation
    }

    fn sum(&self, conn: &Connection, q: &FinanceQuery<'_>) -> AppResult<Option<f64>> {
        let mut stmt = conn.prepare_cached(self.sql)?;
        let v: Option<f64> = stmt.query_row(
            named_params! { ":owner": q.owner, ":job_no": q.job_no, ":day": q.day },
            |row| row.get(0),
        )?;
        Ok(Some(v.unwrap_or(0.0)))
    }
}

/// One column of the latest row valid on `day`; no row yields `None`.
pub struct LatestValue {
    pub relation: &'static str,
    pub sql: &'static str,
}

impl AmountSource for LatestValue {
    fn relation(&self) -> &'static str {
        self.relation
    }

    fn sum(&self, conn: &Connection, q: &FinanceQuery<'_>) -> AppResult<Option<f64>> {
        let mut stmt = conn.prepare_cached(self.sql)?;
        let v: Option<Option<f64>> = stmt
            .query_row(
                named_params! { ":owner": q.owner, ":job_no": q.job_no, ":day": q.day },
                |row| row.get(0),
            )
            .optional()?;
        Ok(v.flatten())
    }
}

pub type Candidates = Vec<Box<dyn AmountSource>>;

pub fn revenue_sources() -> Candidates {
    vec![
        Box::new(SumOf {
            relation: "revenue_entries",
            sql: "SELECT COALESCE(SUM(amount), 0) FROM revenue_entries
                  WHERE owner = :owner AND job_no = :job_no AND occurred_on = :day",
        }),
        Box::new(SumOf {
            relation: "ledger_transactions",
            sql: "SELECT COALESCE(SUM(amount), 0) FROM ledger_transactions
                  WHERE owner = :owner AND job_no = :job_no AND occurred_on = :day
                    AND kind = 'revenue'",
        }),
    ]
}

pub fn cogs_sources() -> Candidates {
    vec![
        Box::new(SumOf {
            relation: "expenses",
            sql: "SELECT COALESCE(SUM(amount), 0) FROM expenses
                  WHERE owner = :owner AND job_no = :job_no AND occurred_on = :day
                    AND lower(category) IN ('materials', 'subcontract', 'labour', 'labor')",
        }),
        Box::new(SumOf {
            relation: "ledger_transactions",
            sql: "SELECT COALESCE(SUM(amount), 0) FROM ledger_transactions
                  WHERE owner = :owner AND job_no = :job_no AND occurred_on = :day
                    AND kind = 'expense'
                    AND lower(category) IN ('materials', 'subcontract', 'labour', 'labor')",
        }),
    ]
}

pub fn change_order_sources() -> Candidates {
    vec![
        Box::new(SumOf {
            relation: "change_orders",
            sql: "SELECT COALESCE(SUM(amount_delta), 0) FROM change_orders
                  WHERE owner = :owner AND job_no = :job_no AND status = 'approved'
                    AND COALESCE(approved_on, created_on) = :day",
        }),
        Box::new(SumOf {
            relation: "job_change_orders",
            sql: "SELECT COALESCE(SUM(amount_delta), 0) FROM job_change_orders
                  WHERE owner = :owner AND job_no = :job_no AND status = 'approved'
                    AND COALESCE(approved_on, created_on) = :day",
        }),
    ]
}

pub fn receivable_sources() -> Candidates {
    vec![
        Box::new(SumOf {
            relation: "invoices",
            sql: "SELECT COALESCE(SUM(balance_due), 0) FROM invoices
                  WHERE owner = :owner AND job_no = :job_no AND issued_on <= :day
                    AND lower(status) IN ('open', 'overdue', 'sent', 'partial')",
        }),
        Box::new(SumOf {
            relation: "receivables",
            sql: "SELECT COALESCE(SUM(balance), 0) FROM receivables
                  WHERE owner = :owner AND job_no = :job_no AND issued_on <= :day
                    AND lower(status) IN ('open', 'overdue', 'sent', 'partial')",
        }),
    ]
}

pub fn payable_sources() -> Candidates {
    vec![
        Box::new(SumOf {
            relation: "bills",
            sql: "SELECT COALESCE(SUM(balance_due), 0) FROM bills
                  WHERE owner = :owner AND job_no = :job_no AND issued_on <= :day
                    AND lower(status) IN ('open', 'overdue', 'partial')",
        }),
        Box::new(SumOf {
            relation: "payables",
            sql: "SELECT COALESCE(SUM(balance), 0) FROM payables
                  WHERE owner = :owner AND job_no = :job_no AND issued_on <= :day
                    AND lower(status) IN ('open', 'overdue', 'partial')",
        }),
    ]
}

pub fn holdback_sources() -> Candidates {
    vec![
        Box::new(SumOf {
            relation: "holdbacks",
            sql: "SELECT COALESCE(SUM(amount), 0) FROM holdbacks
                  WHERE owner = :owner AND job_no = :job_no AND invoiced_on <= :day
                    AND (released_on IS NULL OR released_on > :day)",
        }),
        Box::new(SumOf {
            relation: "invoices",
            sql: "SELECT COALESCE(SUM(holdback_amount), 0) FROM invoices
                  WHERE owner = :owner AND job_no = :job_no AND issued_on <= :day
                    AND (holdback_released_on IS NULL OR holdback_released_on > :day)",
        }),
    ]
}

pub fn estimate_revenue_sources() -> Candidates {
    vec![
        Box::new(LatestValue {
            relation: "estimates",
            sql: "SELECT revenue_amount FROM estimates
                  WHERE owner = :owner AND job_no = :job_no AND valid_from <= :day
                    AND (valid_to IS NULL OR valid_to >= :day)
                  ORDER BY valid_from DESC LIMIT 1",
        }),
        Box::new(LatestValue {
            relation: "job_estimates",
            sql: "SELECT revenue_amount FROM job_estimates
                  WHERE owner = :owner AND job_no = :job_no AND valid_from <= :day
                    AND (valid_to IS NULL OR valid_to >= :day)
                  ORDER BY valid_from DESC LIMIT 1",
        }),
    ]
}

pub fn estimate_cost_sources() -> Candidates {
    vec![
        Box::new(LatestValue {
            relation: "estimates",
            sql: "SELECT cost_amount FROM estimates
                  WHERE owner = :owner AND job_no = :job_no AND valid_from <= :day
                    AND (valid_to IS NULL OR valid_to >= :day)
                  ORDER BY valid_from DESC LIMIT 1",
        }),
        Box::new(LatestValue {
            relation: "job_estimates",
            sql: "SELECT cost_amount FROM job_estimates
                  WHERE owner = :owner AND job_no = :job_no AND valid_from <= :day
                    AND (valid_to IS NULL OR valid_to >= :day)
                  ORDER BY valid_from DESC LIMIT 1",
        }),
    ]
}
