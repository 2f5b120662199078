use super::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::finance::FinanceEnricher;
use crate::core::worker::recompute_day;
use crate::db::log::ttlog_quiet;
use crate::db::retry::RetryPolicy;
use crate::errors::AppResult;
use crate::models::job::JobRef;
use crate::models::owner::Owner;
use crate::ui::messages::success;
use crate::utils::date::parse_day;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Recompute { owner, day, jobs } = cmd {
        let owner = Owner::parse(owner)?;
        let day = parse_day(day)?;
        let jobs: Vec<JobRef> = jobs.iter().filter_map(|j| JobRef::parse(j)).collect();

        let mut pool = open_db(cfg)?;
        let enricher = FinanceEnricher::new(RetryPolicy::from_config(cfg));
        let outcome = recompute_day(&mut pool.conn, cfg, &enricher, &owner, day, &jobs)?;

        ttlog_quiet(
            &pool.conn,
            "recompute",
            &format!("{owner}/{day}"),
            &format!("rollups={} kpi_rows={}", outcome.rollups, outcome.kpi_rows),
        );
        success(format!(
            "Recomputed {owner} {day}: {} rollup(s), {} KPI row(s)",
            outcome.rollups, outcome.kpi_rows
        ));
    }

    Ok(())
}
