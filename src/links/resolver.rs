//! Identity → local source path resolution.
//!
//! Selection among the catalog's items, in order:
//! 1. the first item whose path contains the remote prefix,
//! 2. else the first item whose path starts with the original prefix,
//! 3. else nothing.
//!
//! Movies that resolve to a single file are linked at their parent folder.
//! When both prefixes are set the remote prefix is rewritten to the local one.

use std::path::PathBuf;

use crate::config::{AppConfig, PathMapping};
use crate::context::ServiceContext;
use crate::error::ResolveError;
use crate::media::{CatalogItem, ExternalIdentity, MediaKind};

/// Resolves identities through the catalog port.
pub struct PathResolver<'a> {
    ctx: &'a ServiceContext,
    config: &'a AppConfig,
}

impl<'a> PathResolver<'a> {
    /// Creates a resolver over the given context and config.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: &'a AppConfig) -> Self {
        Self { ctx, config }
    }

    /// Resolves `identity` to the local path that should be linked.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails, finds nothing, or finds nothing
    /// under a configured prefix. All are non-fatal to a pass.
    pub async fn resolve(
        &self,
        identity: &ExternalIdentity,
        kind: MediaKind,
    ) -> Result<PathBuf, ResolveError> {
        let items = self.ctx.catalog.find_by_identity(identity, kind).await.map_err(|e| {
            ResolveError::Lookup { identity: identity.clone(), message: e.to_string() }
        })?;
        if items.is_empty() {
            return Err(ResolveError::NoItems(identity.clone()));
        }
        select_source_path(&items, kind, self.config.mapping(kind))
            .map(PathBuf::from)
            .ok_or_else(|| ResolveError::NoMatchingPrefix(identity.clone()))
    }
}

/// Picks the item to link and turns its path into a local one.
#[must_use]
pub fn select_source_path(
    items: &[CatalogItem],
    kind: MediaKind,
    mapping: &PathMapping,
) -> Option<String> {
    let by_remote =
        mapping.remote_prefix().and_then(|remote| items.iter().find(|i| i.path.contains(remote)));
    let selected = by_remote.or_else(|| {
        mapping
            .original_prefix()
            .and_then(|original| items.iter().find(|i| i.path.starts_with(original)))
    })?;

    let path = if kind == MediaKind::Movie && !selected.is_folder {
        parent_of(&selected.path)
    } else {
        selected.path.as_str()
    };
    Some(mapping.to_local(path))
}

/// Parent of a server path. Either separator may appear since the server can
/// run on another platform than this process.
fn parent_of(path: &str) -> &str {
    match path.rfind(|c| c == '/' || c == '\\') {
        Some(0) => &path[..1],
        Some(idx) => &path[..idx],
        None => path,
    }
}
