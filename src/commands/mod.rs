//! Command dispatch and handlers.

pub mod init;
pub mod rebuild;
pub mod repair;
pub mod status;
pub mod sync;

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Command};
use crate::config::{AppConfig, DEFAULT_CONFIG_PATH};
use crate::context::ServiceContext;
use crate::logging;

/// How a command that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Everything succeeded.
    Clean,
    /// Finished, but some items were skipped.
    Partial,
}

/// Dispatch a parsed command to its handler.
///
/// Loads `.env`, then the config (except for `init`), sets up logging and
/// wires a live service context.
///
/// # Errors
///
/// Returns an error string if the config cannot be loaded or the selected
/// command fails.
pub fn dispatch(cli: &Cli) -> Result<RunStatus, String> {
    let _ = dotenvy::dotenv();
    let path = config_path(cli.config.as_deref());

    if let Command::Init = cli.command {
        let _guard = logging::init(None);
        return init::run(&path);
    }

    let config = AppConfig::load(&path).map_err(|e| e.to_string())?;
    let _guard = logging::init(config.log_file.as_deref());
    let ctx = ServiceContext::live(&config);
    dispatch_with_context(&cli.command, &ctx, &config)
}

/// Dispatch a command with the given service context and config.
///
/// # Errors
///
/// Returns an error string if the command fails.
pub fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    config: &AppConfig,
) -> Result<RunStatus, String> {
    match command {
        Command::Init => Err("init runs before a config is loaded".to_string()),
        Command::Sync { kind, dry_run } => sync::run(ctx, config, *kind, *dry_run),
        Command::Rebuild { kind } => rebuild::run(ctx, config, *kind),
        Command::Repair { kind } => repair::run(ctx, config, *kind),
        Command::Status { kind } => status::run(ctx, config, *kind),
    }
}

fn config_path(flag: Option<&Path>) -> PathBuf {
    flag.map(Path::to_path_buf).unwrap_or_else(|| {
        std::env::var("TRENDLINK_CONFIG")
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
    })
}

/// Runs `future` to completion on a single-threaded runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;
    Ok(runtime.block_on(future))
}
