use crate::db::pool::DbPool;
use crate::db::queries::{list_kpis, list_rollups};
use crate::errors::AppResult;
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::models::owner::Owner;
use crate::ui::messages::warning;
use serde::Serialize;
use std::path::Path;

/// Which derived rows to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Kpis,
    Rollups,
}

pub struct ExportLogic;

impl ExportLogic {
    /// Export KPI rows (reporting) or rollup rows (payroll) for
    /// `from <= day <= to`. Returns the number of rows written.
    #[allow(clippy::too_many_arguments)]
    pub fn export(
        pool: &mut DbPool,
        owner: &Owner,
        from: &str,
        to: &str,
        kind: ExportKind,
        format: ExportFormat,
        file: &str,
        force: bool,
    ) -> AppResult<usize> {
        let path = Path::new(file);
        ensure_writable(path, force)?;

        match kind {
            ExportKind::Kpis => write_rows(&list_kpis(&pool.conn, owner, from, to)?, format, path),
            ExportKind::Rollups => write_rows(&list_rollups(&pool.conn, owner, from, to)?, format, path),
        }
    }
}

fn write_rows<T: Serialize>(rows: &[T], format: ExportFormat, path: &Path) -> AppResult<usize> {
    if rows.is_empty() {
        warning("No rows found for selected range.");
    }

    match format {
        ExportFormat::Csv => export_csv(rows, path)?,
        ExportFormat::Json => export_json(rows, path)?,
    }

    Ok(rows.len())
}
