//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the link engine and an
//! external system (time, filesystem, trending feed, media-server catalog).
//! Implementations live in `src/adapters/`.

pub mod catalog;
pub mod clock;
pub mod feed;
pub mod filesystem;

pub use catalog::{Catalog, CatalogFuture};
pub use clock::Clock;
pub use feed::{FeedFuture, TrendingFeed};
pub use filesystem::FileSystem;
