//! `trendlink sync` command.

use super::{block_on, RunStatus};
use crate::cli::selected_kinds;
use crate::config::AppConfig;
use crate::context::ServiceContext;
use crate::links::{format_actions, format_report, Reconciler};
use crate::media::MediaKind;

/// Execute the `sync` command.
///
/// Each kind is reconciled independently; a fatal error for one kind does
/// not stop the other.
///
/// # Errors
///
/// Returns an error string listing every kind whose pass was aborted.
pub fn run(
    ctx: &ServiceContext,
    config: &AppConfig,
    kind: Option<MediaKind>,
    dry_run: bool,
) -> Result<RunStatus, String> {
    let reconciler = Reconciler::new(ctx, config);
    let mut aborted = Vec::new();
    let mut partial = false;

    for kind in selected_kinds(kind) {
        if dry_run {
            match block_on(reconciler.plan_pass(kind))? {
                Ok(actions) => {
                    println!("Dry run, would perform:");
                    println!("{}", format_actions(kind, &actions));
                }
                Err(e) => {
                    tracing::error!(%kind, error = %e, "dry run aborted");
                    aborted.push(e.to_string());
                }
            }
            continue;
        }

        match block_on(reconciler.run_pass(kind))? {
            Ok(report) => {
                partial |= !report.is_clean();
                println!("{}", format_report(&report));
            }
            Err(e) => {
                tracing::error!(%kind, error = %e, "pass aborted");
                aborted.push(e.to_string());
            }
        }
    }

    if aborted.is_empty() {
        Ok(if partial { RunStatus::Partial } else { RunStatus::Clean })
    } else {
        Err(aborted.join("\n"))
    }
}
