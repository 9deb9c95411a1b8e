//! Media-server catalog port.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

use crate::media::{CatalogItem, ExternalIdentity, MediaKind};

/// Boxed future type alias used by [`Catalog`] to keep the trait dyn-compatible.
pub type CatalogFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, Box<dyn Error + Send + Sync>>> + Send + 'a>>;

/// Looks items up in the media server's library.
pub trait Catalog: Send + Sync {
    /// Finds every library item carrying `identity` as a provider id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with a
    /// non-success status.
    fn find_by_identity(
        &self,
        identity: &ExternalIdentity,
        kind: MediaKind,
    ) -> CatalogFuture<'_, Vec<CatalogItem>>;

    /// Finds the identity of the item stored at `path`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with a
    /// non-success status.
    fn find_by_path(&self, path: &str) -> CatalogFuture<'_, Option<ExternalIdentity>>;
}
