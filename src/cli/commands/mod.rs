pub mod config;
pub mod db;
pub mod init;
pub mod job;
pub mod log;
pub mod owner;
pub mod rate;
pub mod recompute;
pub mod report;
pub mod run;
pub mod touch;

use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::AppResult;

/// Open the configured database with its schema up to date.
pub(crate) fn open_db(cfg: &Config) -> AppResult<DbPool> {
    let pool = DbPool::from_config(cfg)?;
    init_db(&pool.conn)?;
    Ok(pool)
}
