//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::media::MediaKind;

/// Top-level CLI parser for `trendlink`.
#[derive(Debug, Parser)]
#[command(name = "trendlink", version, about = "Mirror trending titles into a symlink library")]
pub struct Cli {
    /// Config file path (defaults to `$TRENDLINK_CONFIG`, then `trendlink.yaml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a template config file if none exists.
    Init,
    /// Reconcile the link trees with the trending feeds.
    Sync {
        /// Only sync one media kind.
        #[arg(long)]
        kind: Option<MediaKind>,
        /// Show what would change without changing anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Rebuild a link store from the symlink directory (best effort).
    Rebuild {
        /// Media kind whose store is rebuilt.
        #[arg(long)]
        kind: MediaKind,
    },
    /// Drop store records whose link no longer exists.
    Repair {
        /// Only repair one media kind.
        #[arg(long)]
        kind: Option<MediaKind>,
    },
    /// List managed links.
    Status {
        /// Only list one media kind.
        #[arg(long)]
        kind: Option<MediaKind>,
    },
}

/// Kinds selected by an optional `--kind` flag.
#[must_use]
pub fn selected_kinds(kind: Option<MediaKind>) -> Vec<MediaKind> {
    kind.map_or_else(|| MediaKind::ALL.to_vec(), |k| vec![k])
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use crate::media::MediaKind;
    use clap::Parser;

    #[test]
    fn parses_sync_with_kind_and_dry_run() {
        let cli = Cli::parse_from(["trendlink", "sync", "--kind", "tv", "--dry-run"]);
        assert!(matches!(
            cli.command,
            Command::Sync { kind: Some(MediaKind::Series), dry_run: true }
        ));
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["trendlink", "status", "--config", "/etc/trendlink.yaml"]);
        assert_eq!(cli.config.unwrap().to_str(), Some("/etc/trendlink.yaml"));
    }

    #[test]
    fn rebuild_requires_kind() {
        assert!(Cli::try_parse_from(["trendlink", "rebuild"]).is_err());
    }

    #[test]
    fn no_kind_selects_both() {
        assert_eq!(super::selected_kinds(None), vec![MediaKind::Movie, MediaKind::Series]);
    }
}
