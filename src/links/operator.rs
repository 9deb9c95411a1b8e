//! Creates and removes single managed links and keeps the store in step.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::context::ServiceContext;
use crate::error::LinkError;
use crate::links::store::LinkStateStore;
use crate::media::{ExternalIdentity, MediaKind};

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// A managed link was removed.
    Removed,
    /// Nothing link-like was at the path; only the record was dropped.
    Missing,
}

/// Performs filesystem mutations for one link at a time.
pub struct LinkOperator<'a> {
    ctx: &'a ServiceContext,
    config: &'a AppConfig,
    store: LinkStateStore<'a>,
}

impl<'a> LinkOperator<'a> {
    /// Creates an operator over the given context and config.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: &'a AppConfig) -> Self {
        Self { ctx, config, store: LinkStateStore::new(ctx, config) }
    }

    /// Where the link for `source` lives: the symlink directory joined with
    /// `source` relative to the original prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if no original prefix is configured or `source` is
    /// not strictly below it.
    pub fn link_path_for(&self, source: &Path, kind: MediaKind) -> Result<PathBuf, LinkError> {
        let mapping = self.config.mapping(kind);
        let prefix = Path::new(mapping.original_prefix().ok_or(LinkError::NoOriginalPath(kind))?);
        match source.strip_prefix(prefix) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                Ok(mapping.symlink_directory.join(relative))
            }
            _ => Err(LinkError::OutsidePrefix {
                source_path: source.to_path_buf(),
                prefix: prefix.to_path_buf(),
            }),
        }
    }

    /// Links `source` into the symlink tree and records it for `identity`.
    ///
    /// Returns the link path. An existing link that already points at
    /// `source` is adopted and recorded; anything else at that path fails.
    /// If the record cannot be written, a freshly created link is removed
    /// again before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is outside the original prefix, the
    /// directories or link cannot be created, or the store cannot be updated.
    pub fn create(
        &self,
        source: &Path,
        kind: MediaKind,
        identity: &ExternalIdentity,
    ) -> Result<PathBuf, LinkError> {
        let link = self.link_path_for(source, kind)?;
        if let Some(parent) = link.parent() {
            self.ctx.fs.create_dir_all(parent).map_err(|e| LinkError::Io {
                operation: "create directory",
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        let adopted = match self.ctx.fs.create_link(source, &link) {
            Ok(()) => {
                tracing::info!(%kind, %identity, link = %link.display(), source = %source.display(), "link created");
                false
            }
            Err(_) if self.points_at(&link, source) => {
                tracing::info!(%kind, %identity, link = %link.display(), "adopting existing link to source");
                true
            }
            Err(e) => {
                return Err(LinkError::Io {
                    operation: "create link",
                    path: link,
                    message: e.to_string(),
                })
            }
        };

        if let Err(err) = self.store.put(kind, &link, identity) {
            // Every link on disk that this operator created has a record.
            if !adopted {
                if let Err(e) = self.ctx.fs.remove_link(&link) {
                    tracing::error!(%kind, link = %link.display(), error = %e, "could not roll back link");
                }
            }
            return Err(err.into());
        }
        Ok(link)
    }

    fn points_at(&self, link: &Path, source: &Path) -> bool {
        self.ctx.fs.is_link(link) && self.ctx.fs.read_link(link).is_ok_and(|target| target == source)
    }

    /// Removes the managed link at `link` and its record.
    ///
    /// A path that is not a link is not an error: the stale record is dropped
    /// and [`DeleteOutcome::Missing`] returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be removed or the store updated.
    pub fn delete(&self, link: &Path, kind: MediaKind) -> Result<DeleteOutcome, LinkError> {
        if !self.ctx.fs.is_link(link) {
            tracing::warn!(%kind, link = %link.display(), "no link found, dropping record");
            self.store.remove(kind, link)?;
            return Ok(DeleteOutcome::Missing);
        }
        self.ctx.fs.remove_link(link).map_err(|e| LinkError::Io {
            operation: "remove link",
            path: link.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::info!(%kind, link = %link.display(), "link deleted");

        self.store.remove(kind, link)?;
        Ok(DeleteOutcome::Removed)
    }
}
