use super::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::touch_queue::TouchQueue;
use crate::errors::{AppError, AppResult};
use crate::models::owner::Owner;
use crate::ui::messages::success;
use crate::utils::date::{generate_range, parse_day};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Touch {
        owner,
        job,
        day,
        from,
        to,
    } = cmd
    {
        let owner = Owner::parse(owner)?;

        let days = match (day, from, to) {
            (Some(d), _, _) => vec![parse_day(d)?],
            (None, Some(f), Some(t)) => generate_range(f, t)?,
            _ => return Err(AppError::InvalidDate("missing day or --from/--to".into())),
        };

        let pool = open_db(cfg)?;
        let tx = pool.conn.unchecked_transaction()?;
        for d in &days {
            TouchQueue::enqueue(&tx, &owner, job.as_deref(), *d)?;
        }
        tx.commit()?;

        success(format!("Queued {} touch(es) for {}", days.len(), owner));
    }

    Ok(())
}
