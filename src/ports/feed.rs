//! Trending feed port.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

use crate::media::{MediaKind, TrendingItem};

/// Boxed future type alias used by [`TrendingFeed`] to keep the trait dyn-compatible.
pub type FeedFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<TrendingItem>, Box<dyn Error + Send + Sync>>> + Send + 'a>>;

/// Fetches the currently trending titles for a media kind.
pub trait TrendingFeed: Send + Sync {
    /// Returns the flattened trending list in feed order.
    ///
    /// An empty `Ok` means the feed really is empty. Callers delete links on
    /// that basis, so adapters must never map a failure to `Ok(vec![])`.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be fetched or parsed.
    fn fetch(&self, kind: MediaKind) -> FeedFuture<'_>;
}
