use super::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::queries::set_hourly_rate;
use crate::errors::{AppError, AppResult};
use crate::models::owner::Owner;
use crate::ui::messages::success;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Rate {
        owner,
        employee,
        rate,
    } = cmd
    {
        let owner = Owner::parse(owner)?;
        if !rate.is_finite() || *rate < 0.0 {
            return Err(AppError::Other(format!("Invalid hourly rate: {rate}")));
        }

        let pool = open_db(cfg)?;
        set_hourly_rate(&pool.conn, &owner, employee.trim(), *rate)?;
        success(format!("Rate for {} ({}) set to {:.2}/h", employee.trim(), owner, rate));
    }

    Ok(())
}
