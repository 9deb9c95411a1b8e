//! Filesystem port for store I/O and managed-link operations.

use std::path::{Path, PathBuf};

/// Provides filesystem access for the link store and the symlink tree.
///
/// Abstracting the filesystem lets the link engine be tested against an
/// in-memory tree without touching the real disk.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(
        &self,
        path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;

    /// Replaces the whole file with `contents`, creating parent directories.
    ///
    /// Readers observe either the old or the new contents, never a mix.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Returns `true` if the path exists (following links).
    fn exists(&self, path: &Path) -> bool;

    /// Creates `path` and any missing parents. Already existing is success.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Creates a directory link at `link` pointing to `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if anything already exists at `link` or the platform
    /// refuses to create the link.
    fn create_link(
        &self,
        target: &Path,
        link: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Returns `true` if `path` itself is a symbolic link or junction.
    fn is_link(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a link whose target still exists.
    /// A dangling link is not live.
    fn is_live_link(&self, path: &Path) -> bool;

    /// Reads the target of the link at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a link.
    fn read_link(&self, path: &Path) -> Result<PathBuf, Box<dyn std::error::Error + Send + Sync>>;

    /// Removes the link at `path` without touching its target.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be removed.
    fn remove_link(&self, path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Recursively lists every link under `root`, sorted, without following
    /// links. A missing root yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be walked.
    fn find_links(&self, root: &Path)
        -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>>;
}
