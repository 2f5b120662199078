use crate::errors::{AppError, AppResult};
use chrono::NaiveDate;

pub fn parse_day(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| AppError::InvalidDate(s.to_string()))
}

pub fn format_day(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Every day in `[start, end]`, inclusive on both ends.
pub fn generate_range(start: &str, end: &str) -> AppResult<Vec<NaiveDate>> {
    let start_date = parse_day(start)?;
    let end_date = parse_day(end)?;

    if end_date < start_date {
        return Err(AppError::InvalidDate(format!("{start}:{end}")));
    }

    let mut out = Vec::new();
    let mut d = start_date;

    while d <= end_date {
        out.push(d);
        match d.succ_opt() {
            Some(next) => d = next,
            None => break,
        }
    }

    Ok(out)
}
