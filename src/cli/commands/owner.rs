use super::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::queries::{load_owner_settings, set_owner_settings};
use crate::errors::AppResult;
use crate::models::owner::Owner;
use crate::ui::messages::success;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Owner {
        owner,
        timezone,
        ot_threshold,
    } = cmd
    {
        let owner = Owner::parse(owner)?;
        let pool = open_db(cfg)?;

        set_owner_settings(&pool.conn, &owner, timezone.as_deref(), *ot_threshold)?;
        let s = load_owner_settings(&pool.conn, &owner, cfg)?;

        success(format!(
            "{}: timezone={} ot_threshold={} min",
            owner, s.timezone, s.daily_ot_threshold_minutes
        ));
    }

    Ok(())
}
