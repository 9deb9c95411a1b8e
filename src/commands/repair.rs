//! `trendlink repair` command.

use super::RunStatus;
use crate::cli::selected_kinds;
use crate::config::AppConfig;
use crate::context::ServiceContext;
use crate::links::Reconciler;
use crate::media::MediaKind;

/// Execute the `repair` command: drop records whose link has disappeared so
/// the next sync recreates them.
///
/// # Errors
///
/// Returns an error string if a store cannot be read or written.
pub fn run(
    ctx: &ServiceContext,
    config: &AppConfig,
    kind: Option<MediaKind>,
) -> Result<RunStatus, String> {
    let reconciler = Reconciler::new(ctx, config);
    for kind in selected_kinds(kind) {
        let purged = reconciler.repair(kind).map_err(|e| e.to_string())?;
        if purged.is_empty() {
            println!("{kind}: all recorded links present.");
            continue;
        }
        println!("{kind}: purged {} record(s)", purged.len());
        for link in &purged {
            println!("  {}", link.display());
        }
    }
    Ok(RunStatus::Clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, test_context, FakeCatalog, FakeFeed, MemFs};

    #[test]
    fn repair_without_stores_is_a_no_op() {
        let (fs, feed, catalog) = (MemFs::new(), FakeFeed::new(), FakeCatalog::new());
        let ctx = test_context(&fs, &feed, &catalog);
        let config = test_config();

        assert_eq!(run(&ctx, &config, None).unwrap(), RunStatus::Clean);
        assert!(fs.ops().is_empty());
    }
}
