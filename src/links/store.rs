//! Durable link-path → identity store, one JSON file per media kind.
//!
//! The store is the only record of which identity a managed link belongs to,
//! since a link on disk carries no identity of its own. Every mutation
//! rewrites the whole file; record counts are small.
//!
//! ```text
//! <state_dir>/
//!   ├── symlinks_movie.json   {"/links/movies/Heat (1995)": "tt0113277", ...}
//!   └── symlinks_tv.json
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::context::ServiceContext;
use crate::error::StoreError;
use crate::media::{ExternalIdentity, MediaKind};

/// In-memory view of one kind's store, indexed both ways.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkState {
    records: BTreeMap<PathBuf, ExternalIdentity>,
    by_identity: HashMap<ExternalIdentity, PathBuf>,
}

impl LinkState {
    /// Builds the state and its identity index from path-keyed records.
    #[must_use]
    pub fn from_records(records: BTreeMap<PathBuf, ExternalIdentity>) -> Self {
        let mut by_identity = HashMap::with_capacity(records.len());
        for (link, identity) in &records {
            by_identity.entry(identity.clone()).or_insert_with(|| link.clone());
        }
        Self { records, by_identity }
    }

    /// Upserts one record.
    pub fn insert(&mut self, link: PathBuf, identity: ExternalIdentity) {
        if let Some(previous) = self.records.insert(link.clone(), identity.clone()) {
            if previous != identity {
                self.unindex(&link, &previous);
            }
        }
        self.by_identity.entry(identity).or_insert(link);
    }

    /// Removes the record for `link`, returning its identity.
    pub fn remove(&mut self, link: &Path) -> Option<ExternalIdentity> {
        let identity = self.records.remove(link)?;
        self.unindex(link, &identity);
        Some(identity)
    }

    fn unindex(&mut self, link: &Path, identity: &ExternalIdentity) {
        if self.by_identity.get(identity).is_some_and(|indexed| indexed == link) {
            self.by_identity.remove(identity);
            // Another link may still carry the same identity.
            if let Some((other, _)) = self.records.iter().find(|(_, id)| *id == identity) {
                self.by_identity.insert(identity.clone(), other.clone());
            }
        }
    }

    /// Identity recorded for `link`.
    #[must_use]
    pub fn identity_of(&self, link: &Path) -> Option<&ExternalIdentity> {
        self.records.get(link)
    }

    /// A link recorded for `identity`, in O(1).
    #[must_use]
    pub fn link_for(&self, identity: &ExternalIdentity) -> Option<&Path> {
        self.by_identity.get(identity).map(PathBuf::as_path)
    }

    /// All records in link-path order.
    pub fn records(&self) -> impl Iterator<Item = (&Path, &ExternalIdentity)> {
        self.records.iter().map(|(link, id)| (link.as_path(), id))
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A link that best-effort recovery could not attribute to an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLink {
    /// The link on disk.
    pub link: PathBuf,
    /// Why it was left out.
    pub reason: String,
}

/// Outcome of rebuilding a store from the symlink tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebuildReport {
    /// Links whose identity was recovered.
    pub recovered: usize,
    /// Links left out of the rebuilt store.
    pub skipped: Vec<SkippedLink>,
}

/// A loaded store, plus the rebuild report when it had to be recovered.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedState {
    /// Current records.
    pub state: LinkState,
    /// Present when no store file existed and the tree was scanned.
    pub rebuilt: Option<RebuildReport>,
}

/// Persistence layer for link records.
///
/// All I/O goes through `ctx.fs`, so the store works against the real disk
/// and the in-memory test filesystem alike.
pub struct LinkStateStore<'a> {
    ctx: &'a ServiceContext,
    config: &'a AppConfig,
}

impl<'a> LinkStateStore<'a> {
    /// Creates a store over the given context and config.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: &'a AppConfig) -> Self {
        Self { ctx, config }
    }

    /// Reads the store file for `kind`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read(&self, kind: MediaKind) -> Result<Option<LinkState>, StoreError> {
        let path = self.config.store_path(kind);
        if !self.ctx.fs.exists(&path) {
            return Ok(None);
        }
        let contents = self
            .ctx
            .fs
            .read_to_string(&path)
            .map_err(|e| StoreError::Read { path: path.clone(), message: e.to_string() })?;
        let records: BTreeMap<PathBuf, ExternalIdentity> =
            serde_json::from_str(&contents).map_err(|source| StoreError::Parse { path, source })?;
        Ok(Some(LinkState::from_records(records)))
    }

    /// Loads the store for `kind` verbatim; when absent, rebuilds it from the
    /// symlink tree and persists the result first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read, the tree cannot be
    /// walked, or the rebuilt store cannot be written.
    pub async fn load(&self, kind: MediaKind) -> Result<LoadedState, StoreError> {
        if let Some(state) = self.read(kind)? {
            return Ok(LoadedState { state, rebuilt: None });
        }
        tracing::info!(%kind, "no link store found, recovering from symlink directory");
        let (state, report) = self.recover(kind).await?;
        Ok(LoadedState { state, rebuilt: Some(report) })
    }

    /// Best-effort recovery: rebuilds the store from the tree and overwrites
    /// whatever store file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be walked or the store written.
    pub async fn recover(&self, kind: MediaKind) -> Result<(LinkState, RebuildReport), StoreError> {
        let (state, report) = self.rebuild(kind).await?;
        self.save(kind, &state)?;
        tracing::info!(
            %kind,
            recovered = report.recovered,
            skipped = report.skipped.len(),
            "link store recovered"
        );
        Ok((state, report))
    }

    /// Scans the symlink tree and reverse-looks-up each link's target.
    /// Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the symlink directory cannot be walked.
    pub async fn rebuild(&self, kind: MediaKind) -> Result<(LinkState, RebuildReport), StoreError> {
        let mapping = self.config.mapping(kind);
        let root = &mapping.symlink_directory;
        let links = self
            .ctx
            .fs
            .find_links(root)
            .map_err(|e| StoreError::Walk { path: root.clone(), message: e.to_string() })?;

        let mut state = LinkState::default();
        let mut report = RebuildReport::default();
        for link in links {
            let target = match self.ctx.fs.read_link(&link) {
                Ok(target) => target,
                Err(e) => {
                    skip(&mut report, kind, link, format!("unreadable link target: {e}"));
                    continue;
                }
            };
            // The media server knows the library by its own paths.
            let server_path = mapping.to_remote(&target.to_string_lossy());
            match self.ctx.catalog.find_by_path(&server_path).await {
                Ok(Some(identity)) => {
                    tracing::debug!(%kind, link = %link.display(), %identity, "recovered link");
                    state.insert(link, identity);
                    report.recovered += 1;
                }
                Ok(None) => {
                    skip(&mut report, kind, link, format!("no catalog identity for {server_path}"));
                }
                Err(e) => skip(&mut report, kind, link, format!("reverse lookup failed: {e}")),
            }
        }
        Ok((state, report))
    }

    /// Upserts one record and persists the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn put(
        &self,
        kind: MediaKind,
        link: &Path,
        identity: &ExternalIdentity,
    ) -> Result<(), StoreError> {
        let mut state = self.read(kind)?.unwrap_or_default();
        state.insert(link.to_path_buf(), identity.clone());
        self.save(kind, &state)
    }

    /// Deletes one record and persists the store. Returns `false` without
    /// writing if there was no such record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn remove(&self, kind: MediaKind, link: &Path) -> Result<bool, StoreError> {
        let Some(mut state) = self.read(kind)? else {
            return Ok(false);
        };
        if state.remove(link).is_none() {
            return Ok(false);
        }
        self.save(kind, &state)?;
        Ok(true)
    }

    /// Replaces the store file for `kind` with `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, kind: MediaKind, state: &LinkState) -> Result<(), StoreError> {
        let path = self.config.store_path(kind);
        let json = serde_json::to_string_pretty(&state.records)
            .map_err(|source| StoreError::Serialize { path: path.clone(), source })?;
        self.ctx
            .fs
            .write(&path, &json)
            .map_err(|e| StoreError::Write { path, message: e.to_string() })
    }
}

fn skip(report: &mut RebuildReport, kind: MediaKind, link: PathBuf, reason: String) {
    tracing::warn!(%kind, link = %link.display(), %reason, "skipping link during recovery");
    report.skipped.push(SkippedLink { link, reason });
}
