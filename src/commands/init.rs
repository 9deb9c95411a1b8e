//! `trendlink init` command.

use std::path::Path;

use super::RunStatus;
use crate::config;

/// Execute the `init` command.
///
/// # Errors
///
/// Returns an error string if the template cannot be written.
pub fn run(path: &Path) -> Result<RunStatus, String> {
    if config::write_template(path).map_err(|e| e.to_string())? {
        println!("{} was created, fill in the required information.", path.display());
    } else {
        println!("{} already exists, leaving it unchanged.", path.display());
    }
    Ok(RunStatus::Clean)
}
