use crate::errors::{AppError, AppResult};
use crate::ui::messages::warning;
use std::path::Path;

/// An existing output file is only replaced with `--force`; exports run
/// from schedulers, so there is no interactive prompt.
pub(crate) fn ensure_writable(path: &Path, force: bool) -> AppResult<()> {
    if !path.exists() {
        return Ok(());
    }

    if force {
        warning(format!("Overwriting existing file '{}'.", path.display()));
        return Ok(());
    }

    Err(AppError::Export(format!(
        "'{}' already exists (use --force to overwrite)",
        path.display()
    )))
}
