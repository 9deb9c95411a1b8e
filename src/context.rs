//! Service context bundling all port trait objects.

use crate::config::AppConfig;
use crate::ports::catalog::Catalog;
use crate::ports::clock::Clock;
use crate::ports::feed::TrendingFeed;
use crate::ports::filesystem::FileSystem;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. The live
/// constructor wires real adapters; tests substitute in-memory ones.
pub struct ServiceContext {
    /// Clock for stamping pass reports.
    pub clock: Box<dyn Clock>,
    /// Filesystem for the link store and the symlink tree.
    pub fs: Box<dyn FileSystem>,
    /// Source of trending titles.
    pub feed: Box<dyn TrendingFeed>,
    /// Media-server catalog for path and identity lookups.
    pub catalog: Box<dyn Catalog>,
}

impl ServiceContext {
    /// Creates a live context with real adapters configured from `config`.
    #[must_use]
    pub fn live(config: &AppConfig) -> Self {
        use crate::adapters::live::clock::LiveClock;
        use crate::adapters::live::emby::EmbyCatalog;
        use crate::adapters::live::filesystem::LiveFileSystem;
        use crate::adapters::live::trakt::TraktFeed;

        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            feed: Box::new(TraktFeed::new(&config.trakt)),
            catalog: Box::new(EmbyCatalog::new(&config.emby)),
        }
    }
}
