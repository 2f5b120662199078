use super::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::worker::run_batch;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Run { limit, fan_out } = cmd {
        let mut cfg = cfg.clone();
        if let Some(l) = limit {
            cfg.batch_limit = *l;
        }
        if let Some(f) = fan_out {
            cfg.fan_out = *f;
        }

        let mut pool = open_db(&cfg)?;
        let report = run_batch(&mut pool, &cfg)?;

        let line = format!(
            "Batch done: claimed={} groups={} applied={} failed={} kpi_rows={}",
            report.claimed, report.groups, report.applied, report.failed, report.kpi_rows
        );
        if report.failed > 0 {
            warning(line);
        } else {
            success(line);
        }
    }

    Ok(())
}
