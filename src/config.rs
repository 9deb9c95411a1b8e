//! Application configuration, loaded once per invocation.
//!
//! The config file is YAML. API credentials may also come from the
//! environment (or a `.env` file), which takes precedence over the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::media::MediaKind;

const PLACEHOLDER_KEY: &str = "API_KEY_HERE";
const PLACEHOLDER_DIR: &str = "PATH_TO_SYMLINK_DIRECTORY";

/// Default config location relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "trendlink.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Trending feed settings.
    pub trakt: TraktConfig,
    /// Media server settings.
    pub emby: EmbyConfig,
    /// Path mapping for movies.
    pub movies: PathMapping,
    /// Path mapping for series.
    pub series: PathMapping,
    /// Directory holding the per-kind link store files.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Re-check that already-recorded links still exist before skipping them.
    #[serde(default = "default_true")]
    pub verify_links: bool,
    /// Optional log file in addition to stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

/// Trakt API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraktConfig {
    /// Trakt client id sent as `trakt-api-key`.
    pub api_key: String,
    /// Items per page requested from the trending endpoint.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Upper bound on the number of pages fetched per kind.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

/// Emby server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbyConfig {
    /// Base URL, e.g. `http://localhost:8096`.
    #[serde(default = "default_emby_url")]
    pub url: String,
    /// API token sent as `X-Emby-Token`.
    pub api_key: String,
}

/// Where one kind's media lives and where its links go.
///
/// `remote_path`, when set, is a prefix of the paths the media server reports;
/// it is rewritten to `original_path` to reach the same folder locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathMapping {
    /// Local root of the real library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,
    /// Root of the managed symlink tree.
    pub symlink_directory: PathBuf,
    /// Library root as seen by the media server host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_path: Option<String>,
}

impl PathMapping {
    /// Non-empty remote prefix, if configured.
    #[must_use]
    pub fn remote_prefix(&self) -> Option<&str> {
        self.remote_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Non-empty original (local) prefix, if configured.
    #[must_use]
    pub fn original_prefix(&self) -> Option<&str> {
        self.original_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Rewrites a media-server path into a locally reachable one.
    ///
    /// Only applies when both prefixes are configured; the first occurrence
    /// of the remote prefix is replaced.
    #[must_use]
    pub fn to_local(&self, path: &str) -> String {
        match (self.remote_prefix(), self.original_prefix()) {
            (Some(remote), Some(local)) => path.replacen(remote, local, 1),
            _ => path.to_string(),
        }
    }

    /// Inverse of [`PathMapping::to_local`] for a path under the local prefix.
    #[must_use]
    pub fn to_remote(&self, path: &str) -> String {
        match (self.remote_prefix(), self.original_prefix()) {
            (Some(remote), Some(local)) if path.starts_with(local) => {
                format!("{remote}{}", &path[local.len()..])
            }
            _ => path.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads and validates the config at `path`, then applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, not valid YAML,
    /// or still contains template placeholders.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let mut config = Self::from_yaml(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses a config document without validation.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the document does not match the schema.
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// The path mapping for `kind`.
    #[must_use]
    pub fn mapping(&self, kind: MediaKind) -> &PathMapping {
        match kind {
            MediaKind::Movie => &self.movies,
            MediaKind::Series => &self.series,
        }
    }

    /// Store file for `kind`. File names match earlier releases so existing
    /// stores keep working.
    #[must_use]
    pub fn store_path(&self, kind: MediaKind) -> PathBuf {
        let name = match kind {
            MediaKind::Movie => "symlinks_movie.json",
            MediaKind::Series => "symlinks_tv.json",
        };
        self.state_dir.join(name)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("TRAKT_API_KEY") {
            self.trakt.api_key = key;
        }
        if let Some(key) = lookup("EMBY_API_KEY") {
            self.emby.api_key = key;
        }
        if let Some(url) = lookup("EMBY_URL") {
            self.emby.url = url;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.trakt.api_key.is_empty() || self.trakt.api_key == PLACEHOLDER_KEY {
            return Err(ConfigError::Placeholder("trakt.api_key"));
        }
        if self.emby.api_key.is_empty() || self.emby.api_key == PLACEHOLDER_KEY {
            return Err(ConfigError::Placeholder("emby.api_key"));
        }
        if self.movies.symlink_directory.as_os_str() == PLACEHOLDER_DIR {
            return Err(ConfigError::Placeholder("movies.symlink_directory"));
        }
        if self.series.symlink_directory.as_os_str() == PLACEHOLDER_DIR {
            return Err(ConfigError::Placeholder("series.symlink_directory"));
        }
        Ok(())
    }

    /// The template written by `trendlink init`.
    #[must_use]
    pub fn template() -> Self {
        Self {
            trakt: TraktConfig {
                api_key: PLACEHOLDER_KEY.into(),
                page_limit: default_page_limit(),
                max_pages: default_max_pages(),
            },
            emby: EmbyConfig { url: default_emby_url(), api_key: PLACEHOLDER_KEY.into() },
            movies: PathMapping {
                original_path: Some("PATH_TO_MOVIES".into()),
                symlink_directory: PathBuf::from(PLACEHOLDER_DIR),
                remote_path: Some("PATH_TO_MOVIES".into()),
            },
            series: PathMapping {
                original_path: Some("PATH_TO_TV_SHOWS".into()),
                symlink_directory: PathBuf::from(PLACEHOLDER_DIR),
                remote_path: Some("PATH_TO_TV_SHOWS".into()),
            },
            state_dir: default_state_dir(),
            verify_links: true,
            log_file: Some(PathBuf::from("sync.log")),
        }
    }
}

/// Writes the template config to `path` unless a file already exists.
///
/// Returns `true` when a new file was written.
///
/// # Errors
///
/// Returns an error if the template cannot be serialized or written.
pub fn write_template(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    let yaml = serde_yaml::to_string(&AppConfig::template())
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    }
    std::fs::write(path, yaml)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    Ok(true)
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

fn default_page_limit() -> u32 {
    50
}

fn default_max_pages() -> u32 {
    1
}

fn default_emby_url() -> String {
    "http://localhost:8096".into()
}
