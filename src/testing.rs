//! In-memory port implementations shared by unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::config::AppConfig;
use crate::context::ServiceContext;
use crate::media::{CatalogItem, ExternalIdentity, MediaKind, TrendingItem};
use crate::ports::catalog::{Catalog, CatalogFuture};
use crate::ports::clock::Clock;
use crate::ports::feed::{FeedFuture, TrendingFeed};
use crate::ports::filesystem::FileSystem;

type PortResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Default)]
struct MemTree {
    files: HashMap<PathBuf, String>,
    dirs: HashSet<PathBuf>,
    links: BTreeMap<PathBuf, PathBuf>,
    removed_targets: HashSet<PathBuf>,
    ops: Vec<String>,
}

impl MemTree {
    fn occupied(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path) || self.links.contains_key(path)
    }

    fn add_dirs(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                self.dirs.insert(ancestor.to_path_buf());
            }
        }
    }
}

/// In-memory filesystem that records every mutating call.
#[derive(Clone, Default)]
pub struct MemFs {
    tree: Arc<Mutex<MemTree>>,
    fail_writes: Arc<AtomicBool>,
    fail_walks: Arc<AtomicBool>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a link as if created outside the engine. Not recorded as an op.
    pub fn add_link(&self, link: &str, target: &str) {
        let mut tree = self.tree.lock().unwrap();
        if let Some(parent) = Path::new(link).parent() {
            tree.add_dirs(parent);
        }
        tree.links.insert(PathBuf::from(link), PathBuf::from(target));
    }

    /// Removes a link behind the engine's back.
    pub fn drop_link(&self, link: &str) {
        self.tree.lock().unwrap().links.remove(Path::new(link));
    }

    /// Makes every link pointing at `target` dangle.
    pub fn remove_target(&self, target: &str) {
        self.tree.lock().unwrap().removed_targets.insert(PathBuf::from(target));
    }

    pub fn add_dir(&self, path: &str) {
        self.tree.lock().unwrap().add_dirs(Path::new(path));
    }

    pub fn put_file(&self, path: &str, contents: &str) {
        self.tree.lock().unwrap().files.insert(PathBuf::from(path), contents.to_string());
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.tree.lock().unwrap().files.get(Path::new(path)).cloned()
    }

    pub fn links(&self) -> BTreeMap<PathBuf, PathBuf> {
        self.tree.lock().unwrap().links.clone()
    }

    pub fn ops(&self) -> Vec<String> {
        self.tree.lock().unwrap().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.tree.lock().unwrap().ops.clear();
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_walks(&self, fail: bool) {
        self.fail_walks.store(fail, Ordering::SeqCst);
    }
}

impl FileSystem for MemFs {
    fn read_to_string(&self, path: &Path) -> PortResult<String> {
        let tree = self.tree.lock().unwrap();
        tree.files
            .get(path)
            .cloned()
            .ok_or_else(|| format!("File not found: {}", path.display()).into())
    }

    fn write(&self, path: &Path, contents: &str) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err("disk full".into());
        }
        let mut tree = self.tree.lock().unwrap();
        tree.ops.push(format!("write {}", path.display()));
        tree.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let tree = self.tree.lock().unwrap();
        tree.occupied(path) || tree.files.keys().any(|k| k.starts_with(path))
    }

    fn create_dir_all(&self, path: &Path) -> PortResult<()> {
        let mut tree = self.tree.lock().unwrap();
        if tree.files.contains_key(path) {
            return Err(format!("Not a directory: {}", path.display()).into());
        }
        if !tree.dirs.contains(path) {
            tree.ops.push(format!("mkdir {}", path.display()));
            tree.add_dirs(path);
        }
        Ok(())
    }

    fn create_link(&self, target: &Path, link: &Path) -> PortResult<()> {
        let mut tree = self.tree.lock().unwrap();
        if tree.occupied(link) {
            return Err(format!("File exists: {}", link.display()).into());
        }
        if let Some(parent) = link.parent() {
            if !tree.dirs.contains(parent) {
                return Err(format!("No such file or directory: {}", parent.display()).into());
            }
        }
        tree.ops.push(format!("link {} -> {}", link.display(), target.display()));
        tree.links.insert(link.to_path_buf(), target.to_path_buf());
        Ok(())
    }

    fn is_link(&self, path: &Path) -> bool {
        self.tree.lock().unwrap().links.contains_key(path)
    }

    fn is_live_link(&self, path: &Path) -> bool {
        let tree = self.tree.lock().unwrap();
        tree.links.get(path).is_some_and(|target| !tree.removed_targets.contains(target))
    }

    fn read_link(&self, path: &Path) -> PortResult<PathBuf> {
        let tree = self.tree.lock().unwrap();
        tree.links.get(path).cloned().ok_or_else(|| format!("Not a link: {}", path.display()).into())
    }

    fn remove_link(&self, path: &Path) -> PortResult<()> {
        let mut tree = self.tree.lock().unwrap();
        if tree.links.remove(path).is_none() {
            return Err(format!("Not a link: {}", path.display()).into());
        }
        tree.ops.push(format!("unlink {}", path.display()));
        Ok(())
    }

    fn find_links(&self, root: &Path) -> PortResult<Vec<PathBuf>> {
        if self.fail_walks.load(Ordering::SeqCst) {
            return Err(format!("Permission denied: {}", root.display()).into());
        }
        let tree = self.tree.lock().unwrap();
        Ok(tree.links.keys().filter(|k| k.starts_with(root) && *k != root).cloned().collect())
    }
}

/// Trending feed whose per-kind answer can be swapped between passes.
#[derive(Clone, Default)]
pub struct FakeFeed {
    answers: Arc<Mutex<HashMap<MediaKind, Result<Vec<TrendingItem>, String>>>>,
}

impl FakeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, kind: MediaKind, ids: &[&str]) {
        let items = ids
            .iter()
            .map(|id| TrendingItem { identity: ExternalIdentity::new(*id), title: format!("Title {id}") })
            .collect();
        self.answers.lock().unwrap().insert(kind, Ok(items));
    }

    pub fn fail(&self, kind: MediaKind, message: &str) {
        self.answers.lock().unwrap().insert(kind, Err(message.to_string()));
    }
}

impl TrendingFeed for FakeFeed {
    fn fetch(&self, kind: MediaKind) -> FeedFuture<'_> {
        let answer = self.answers.lock().unwrap().get(&kind).cloned();
        Box::pin(async move {
            match answer {
                Some(Ok(items)) => Ok(items),
                Some(Err(message)) => Err(message.into()),
                None => Err(format!("no feed scripted for {kind}").into()),
            }
        })
    }
}

/// Catalog answering from scripted tables.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    by_identity: Arc<Mutex<HashMap<String, Vec<CatalogItem>>>>,
    by_path: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&self, identity: &str, path: &str, is_folder: bool) {
        self.by_identity
            .lock()
            .unwrap()
            .entry(identity.to_string())
            .or_default()
            .push(CatalogItem { path: path.to_string(), is_folder });
    }

    pub fn add_path(&self, path: &str, identity: &str) {
        self.by_path.lock().unwrap().insert(path.to_string(), identity.to_string());
    }

    /// Makes every lookup involving `key` (identity or path) fail.
    pub fn fail_on(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl Catalog for FakeCatalog {
    fn find_by_identity(
        &self,
        identity: &ExternalIdentity,
        _kind: MediaKind,
    ) -> CatalogFuture<'_, Vec<CatalogItem>> {
        let key = identity.as_str().to_string();
        self.lookups.lock().unwrap().push(key.clone());
        let failing = self.failing.lock().unwrap().contains(&key);
        let items = self.by_identity.lock().unwrap().get(&key).cloned().unwrap_or_default();
        Box::pin(async move {
            if failing {
                return Err("Emby API error (500)".into());
            }
            Ok(items)
        })
    }

    fn find_by_path(&self, path: &str) -> CatalogFuture<'_, Option<ExternalIdentity>> {
        self.lookups.lock().unwrap().push(path.to_string());
        let failing = self.failing.lock().unwrap().contains(path);
        let found = self.by_path.lock().unwrap().get(path).cloned();
        Box::pin(async move {
            if failing {
                return Err("Emby API error (500)".into());
            }
            Ok(found.map(ExternalIdentity::new))
        })
    }
}

pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
    }
}

/// Movies use a remote→local rewrite; series have no remote prefix.
pub fn test_config() -> AppConfig {
    AppConfig::from_yaml(
        r"
trakt:
  api_key: trakt-key
emby:
  api_key: emby-key
movies:
  original_path: /media/movies
  symlink_directory: /links/movies
  remote_path: /remote/movies
series:
  original_path: /media/tv
  symlink_directory: /links/tv
state_dir: /state
",
    )
    .unwrap()
}

pub fn test_context(fs: &MemFs, feed: &FakeFeed, catalog: &FakeCatalog) -> ServiceContext {
    ServiceContext {
        clock: Box::new(FixedClock),
        fs: Box::new(fs.clone()),
        feed: Box::new(feed.clone()),
        catalog: Box::new(catalog.clone()),
    }
}
