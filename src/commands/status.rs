//! `trendlink status` command.

use super::RunStatus;
use crate::cli::selected_kinds;
use crate::config::AppConfig;
use crate::context::ServiceContext;
use crate::links::LinkStateStore;
use crate::media::MediaKind;

/// Execute the `status` command.
///
/// Displays a table of managed links per kind showing identity, link path and
/// whether the link is still present and reaches its target.
///
/// # Errors
///
/// Returns an error string if a store cannot be read.
pub fn run(
    ctx: &ServiceContext,
    config: &AppConfig,
    kind: Option<MediaKind>,
) -> Result<RunStatus, String> {
    let store = LinkStateStore::new(ctx, config);
    for kind in selected_kinds(kind) {
        let Some(state) = store.read(kind).map_err(|e| e.to_string())? else {
            println!("{kind}: no link store yet ({}).", config.store_path(kind).display());
            continue;
        };
        if state.is_empty() {
            println!("{kind}: No managed links.");
            continue;
        }

        let rows: Vec<(String, String, &str)> = state
            .records()
            .map(|(link, identity)| {
                let present = if ctx.fs.is_live_link(link) {
                    "ok"
                } else if ctx.fs.is_link(link) {
                    "broken"
                } else {
                    "missing"
                };
                (identity.to_string(), link.display().to_string(), present)
            })
            .collect();

        let id_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(8).max(8);
        let link_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(4).max(4);

        println!("{kind}: {} managed link(s)", rows.len());
        println!("{:<id_width$}  {:<link_width$}  STATE", "IDENTITY", "LINK");
        println!("{:-<id_width$}  {:-<link_width$}  -----", "", "");
        for (identity, link, present) in &rows {
            println!("{identity:<id_width$}  {link:<link_width$}  {present}");
        }
    }
    Ok(RunStatus::Clean)
}
