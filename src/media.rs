//! Media-domain value types shared by the ports and the link engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two libraries kept in sync. Each kind has its own config section,
/// its own store file and its own symlink tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Feature films, linked at release-folder granularity.
    Movie,
    /// TV shows, linked at series-folder granularity.
    Series,
}

impl MediaKind {
    /// Both kinds, in the order a full sync processes them.
    pub const ALL: [MediaKind; 2] = [MediaKind::Movie, MediaKind::Series];

    /// Short lowercase label used in logs and reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaKind::Movie),
            "series" | "tv" | "show" | "shows" => Ok(MediaKind::Series),
            other => Err(format!("Unknown media kind: {other}. Expected movie or series")),
        }
    }
}

/// Cross-catalog identifier (an IMDb id such as `tt0111161`).
///
/// The only join key between trending data and media-server data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalIdentity(String);

impl ExternalIdentity {
    /// Wraps a raw identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExternalIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One entry of the trending feed, in feed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingItem {
    /// Identity used to join with the media server.
    pub identity: ExternalIdentity,
    /// Display title, only used for logging.
    pub title: String,
}

/// A media-server item returned by an identity lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    /// Path of the item as the media server sees it.
    pub path: String,
    /// Whether the item is a folder rather than a single file.
    pub is_folder: bool,
}
