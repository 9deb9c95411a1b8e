//! `trendlink rebuild` command.

use super::{block_on, RunStatus};
use crate::config::AppConfig;
use crate::context::ServiceContext;
use crate::links::LinkStateStore;
use crate::media::MediaKind;

/// Execute the `rebuild` command: replace the store for `kind` with one
/// recovered from the symlink directory.
///
/// Recovery is best effort. Links whose identity cannot be looked up are left
/// out and listed, and the run is reported as partial.
///
/// # Errors
///
/// Returns an error string if the tree cannot be walked or the store written.
pub fn run(ctx: &ServiceContext, config: &AppConfig, kind: MediaKind) -> Result<RunStatus, String> {
    let store = LinkStateStore::new(ctx, config);
    let (state, report) = block_on(store.recover(kind))?.map_err(|e| e.to_string())?;

    println!("{kind}: recovered {} of {} links", report.recovered, state.len() + report.skipped.len());
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.link.display(), skipped.reason);
    }

    Ok(if report.skipped.is_empty() { RunStatus::Clean } else { RunStatus::Partial })
}
