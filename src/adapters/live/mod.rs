//! Live adapters for real external interactions.

pub mod clock;
pub mod emby;
pub mod filesystem;
pub mod trakt;
