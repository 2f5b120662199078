use super::open_db;
use crate::cli::parser::{Commands, JobAction};
use crate::config::Config;
use crate::core::jobs::{ensure_job_by_name, list_jobs};
use crate::db::retry::{RetryPolicy, with_retry};
use crate::errors::AppResult;
use crate::models::owner::Owner;
use crate::ui::messages::{info, success};
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Job { action } = cmd {
        let mut pool = open_db(cfg)?;

        match action {
            JobAction::Ensure { owner, name } => {
                let owner = Owner::parse(owner)?;
                let job = with_retry(RetryPolicy::from_config(cfg), "ensure_job_by_name", || {
                    ensure_job_by_name(&mut pool.conn, &owner, name)
                })?;
                success(format!("Job #{} '{}' ({})", job.job_no, job.name, job.owner));
            }
            JobAction::List { owner } => {
                let owner = Owner::parse(owner)?;
                let jobs = list_jobs(&pool.conn, &owner)?;
                if jobs.is_empty() {
                    info(format!("No jobs for {owner}"));
                    return Ok(());
                }

                let mut table = Table::new(["job_no", "name", "active", "created_at"]);
                for j in jobs {
                    table.add_row(vec![
                        j.job_no.to_string(),
                        j.name,
                        if j.active { "yes".into() } else { "no".into() },
                        j.created_at,
                    ]);
                }
                print!("{}", table.render());
            }
        }
    }

    Ok(())
}
