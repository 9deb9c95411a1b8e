//! Error taxonomy for a reconciliation pass.
//!
//! Pass-fatal errors (`SyncError`) abort only the pass for one media kind.
//! Per-identity and per-record errors (`ResolveError`, `LinkError`) are
//! reported and skipped.

use std::path::PathBuf;

use thiserror::Error;

use crate::media::{ExternalIdentity, MediaKind};

/// Failure while reading or writing a durable link store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store file exists but could not be read.
    #[error("Failed to read link store {}: {message}", path.display())]
    Read {
        /// Store file path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// The store file is not a valid path → identity map.
    #[error("Failed to parse link store {}: {source}", path.display())]
    Parse {
        /// Store file path.
        path: PathBuf,
        /// JSON error.
        source: serde_json::Error,
    },
    /// The store could not be serialized.
    #[error("Failed to serialize link store {}: {source}", path.display())]
    Serialize {
        /// Store file path.
        path: PathBuf,
        /// JSON error.
        source: serde_json::Error,
    },
    /// The symlink directory could not be walked during a rebuild.
    #[error("Failed to scan symlink directory {}: {message}", path.display())]
    Walk {
        /// Symlink directory root.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// The store file could not be written.
    #[error("Failed to write link store {}: {message}", path.display())]
    Write {
        /// Store file path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
}

/// Why an identity could not be turned into a local source path.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The catalog lookup itself failed (network or non-success status).
    #[error("Catalog lookup for {identity} failed: {message}")]
    Lookup {
        /// Identity that was looked up.
        identity: ExternalIdentity,
        /// Underlying error text.
        message: String,
    },
    /// The catalog returned no items for the identity.
    #[error("No catalog items found for {0}")]
    NoItems(ExternalIdentity),
    /// Items came back but none lies under a configured prefix.
    #[error("No catalog item for {0} matches the remote or original path")]
    NoMatchingPrefix(ExternalIdentity),
}

/// Failure creating or removing a single managed link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The kind has no `original_path`, so link paths cannot be derived.
    #[error("No original_path configured for {0}")]
    NoOriginalPath(MediaKind),
    /// The source path escapes the configured original prefix.
    #[error("Source path {} is not under original path {}", source_path.display(), prefix.display())]
    OutsidePrefix {
        /// Resolved source path.
        source_path: PathBuf,
        /// Configured original prefix.
        prefix: PathBuf,
    },
    /// An OS-level filesystem operation failed.
    #[error("{operation} {} failed: {message}", path.display())]
    Io {
        /// What was being attempted.
        operation: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// The filesystem change succeeded but the store could not be updated.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Pass-level failure for one media kind.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The trending feed could not be fetched; nothing was changed.
    #[error("Failed to fetch trending {kind} feed: {message}")]
    Fetch {
        /// Kind whose feed failed.
        kind: MediaKind,
        /// Underlying error text.
        message: String,
    },
    /// The durable store is unreadable or unwritable.
    #[error("Link store failure for {kind}: {source}")]
    Store {
        /// Kind whose store failed.
        kind: MediaKind,
        /// Store error.
        source: StoreError,
    },
}

/// Failure loading or bootstrapping configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config file at the expected location.
    #[error("Config file {} not found. Run `trendlink init` to create one", .0.display())]
    Missing(PathBuf),
    /// The config file could not be read or written.
    #[error("Config file {}: {source}", path.display())]
    Io {
        /// Config file path.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },
    /// The config file is not valid YAML for `AppConfig`.
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// YAML error.
        source: serde_yaml::Error,
    },
    /// A required value still holds the template placeholder.
    #[error("Config value `{0}` is not set; edit the config file")]
    Placeholder(&'static str),
}
