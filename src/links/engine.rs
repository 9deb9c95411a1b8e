//! Reconciliation of the managed link tree against the trending feed.
//!
//! A pass runs in two phases. The create phase links every trending identity
//! that has no record yet. The delete phase then re-reads the store and
//! removes every record whose identity is no longer trending. A link is never
//! removed while its identity is still wanted, and every decision is
//! recomputed from current state, so an interrupted pass is resumed by simply
//! running the next one.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::context::ServiceContext;
use crate::error::{LinkError, StoreError, SyncError};
use crate::links::operator::{DeleteOutcome, LinkOperator};
use crate::links::resolver::PathResolver;
use crate::links::store::{LinkState, LinkStateStore, RebuildReport};
use crate::media::{ExternalIdentity, MediaKind, TrendingItem};

/// Which step of a pass a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Identity → source path lookup.
    Resolve,
    /// Link creation.
    Create,
    /// Link removal.
    Delete,
}

/// A per-identity or per-record failure that was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// Step that failed.
    pub operation: Operation,
    /// Identity or link path the step was working on.
    pub subject: String,
    /// Error text.
    pub message: String,
}

/// What one pass did for one media kind.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    /// Kind reconciled.
    pub kind: MediaKind,
    /// When the pass started.
    pub started_at: DateTime<Utc>,
    /// When the pass finished.
    pub finished_at: DateTime<Utc>,
    /// Distinct trending identities.
    pub trending: usize,
    /// Links created this pass.
    pub created: Vec<(ExternalIdentity, PathBuf)>,
    /// Trending identities that were already linked.
    pub kept: usize,
    /// Links removed this pass.
    pub deleted: Vec<PathBuf>,
    /// Records dropped because their link was already gone.
    pub missing: Vec<PathBuf>,
    /// Skipped failures.
    pub failures: Vec<Failure>,
    /// Present when the store had to be recovered from the tree.
    pub rebuilt: Option<RebuildReport>,
}

impl PassReport {
    /// `true` when nothing was skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.rebuilt.as_ref().map_or(true, |r| r.skipped.is_empty())
    }
}

/// What a pass would do, computed without mutating anything.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkAction {
    /// A link would be created.
    Create {
        /// Trending identity.
        identity: ExternalIdentity,
        /// Feed title.
        title: String,
        /// Link that would be created.
        link: PathBuf,
    },
    /// The identity is already linked.
    Keep {
        /// Trending identity.
        identity: ExternalIdentity,
        /// Existing link.
        link: PathBuf,
    },
    /// The link would be removed.
    Delete {
        /// Identity no longer trending.
        identity: ExternalIdentity,
        /// Link that would be removed.
        link: PathBuf,
    },
    /// The identity cannot be linked.
    Unresolved {
        /// Trending identity.
        identity: ExternalIdentity,
        /// Feed title.
        title: String,
        /// Why.
        reason: String,
    },
}

/// Distinct trending identities in feed order.
struct TrendingSet<'t> {
    ordered: Vec<&'t TrendingItem>,
    ids: HashSet<&'t ExternalIdentity>,
}

impl<'t> TrendingSet<'t> {
    fn new(items: &'t [TrendingItem]) -> Self {
        let mut ordered = Vec::with_capacity(items.len());
        let mut ids = HashSet::with_capacity(items.len());
        for item in items {
            if ids.insert(&item.identity) {
                ordered.push(item);
            }
        }
        Self { ordered, ids }
    }

    fn contains(&self, identity: &ExternalIdentity) -> bool {
        self.ids.contains(identity)
    }
}

/// Drives resolver, operator and store through a pass.
pub struct Reconciler<'a> {
    ctx: &'a ServiceContext,
    config: &'a AppConfig,
    store: LinkStateStore<'a>,
    resolver: PathResolver<'a>,
    operator: LinkOperator<'a>,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler over the given context and config.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: &'a AppConfig) -> Self {
        Self {
            ctx,
            config,
            store: LinkStateStore::new(ctx, config),
            resolver: PathResolver::new(ctx, config),
            operator: LinkOperator::new(ctx, config),
        }
    }

    /// Fetches the trending feed for `kind` and reconciles against it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fetch`] without touching anything if the feed
    /// cannot be fetched, or [`SyncError::Store`] if the store fails.
    pub async fn run_pass(&self, kind: MediaKind) -> Result<PassReport, SyncError> {
        let trending = self.fetch(kind).await?;
        self.reconcile(kind, &trending).await
    }

    /// Fetches the trending feed for `kind` and plans a pass against it.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be fetched or the store read.
    pub async fn plan_pass(&self, kind: MediaKind) -> Result<Vec<LinkAction>, SyncError> {
        let trending = self.fetch(kind).await?;
        self.plan(kind, &trending).await
    }

    async fn fetch(&self, kind: MediaKind) -> Result<Vec<TrendingItem>, SyncError> {
        let trending = self
            .ctx
            .feed
            .fetch(kind)
            .await
            .map_err(|e| SyncError::Fetch { kind, message: e.to_string() })?;
        tracing::info!(%kind, count = trending.len(), "trending feed fetched");
        Ok(trending)
    }

    /// Runs one create-then-delete pass for `kind` against `trending`.
    ///
    /// Per-identity and per-record failures are recorded in the report and
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the store cannot be read or written;
    /// changes made before the failure stay in place.
    pub async fn reconcile(
        &self,
        kind: MediaKind,
        trending: &[TrendingItem],
    ) -> Result<PassReport, SyncError> {
        let store_failed = |source: StoreError| SyncError::Store { kind, source };
        let started_at = self.ctx.clock.now();
        let wanted = TrendingSet::new(trending);
        let loaded = self.store.load(kind).await.map_err(store_failed)?;
        let existing = loaded.state;

        let mut report = PassReport {
            kind,
            started_at,
            finished_at: started_at,
            trending: wanted.ordered.len(),
            created: Vec::new(),
            kept: 0,
            deleted: Vec::new(),
            missing: Vec::new(),
            failures: Vec::new(),
            rebuilt: loaded.rebuilt,
        };

        for item in &wanted.ordered {
            let identity = &item.identity;
            if let Some(link) = existing.link_for(identity) {
                if !self.config.verify_links || self.ctx.fs.is_live_link(link) {
                    tracing::debug!(%kind, %identity, link = %link.display(), "already linked");
                    report.kept += 1;
                    continue;
                }
                tracing::warn!(%kind, %identity, link = %link.display(), "recorded link is missing or broken, relinking");
                match self.operator.delete(link, kind) {
                    Ok(_) => report.missing.push(link.to_path_buf()),
                    Err(LinkError::Store(err)) => return Err(store_failed(err)),
                    Err(e) => {
                        tracing::error!(%kind, %identity, link = %link.display(), error = %e, "could not clear broken link");
                        report.failures.push(Failure {
                            operation: Operation::Delete,
                            subject: link.display().to_string(),
                            message: e.to_string(),
                        });
                        continue;
                    }
                }
            }

            tracing::info!(%kind, %identity, title = %item.title, "linking trending title");
            let source = match self.resolver.resolve(identity, kind).await {
                Ok(source) => source,
                Err(e) => {
                    tracing::error!(%kind, %identity, error = %e, "could not resolve source path");
                    report.failures.push(Failure {
                        operation: Operation::Resolve,
                        subject: identity.to_string(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            match self.operator.create(&source, kind, identity) {
                Ok(link) => report.created.push((identity.clone(), link)),
                Err(LinkError::Store(err)) => return Err(store_failed(err)),
                Err(e) => {
                    tracing::error!(%kind, %identity, source = %source.display(), error = %e, "could not create link");
                    report.failures.push(Failure {
                        operation: Operation::Create,
                        subject: identity.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        // Re-read so the delete phase sees exactly what is persisted.
        let existing = self.store.read(kind).map_err(store_failed)?.unwrap_or_default();
        for (link, identity) in existing.records() {
            if wanted.contains(identity) {
                continue;
            }
            match self.operator.delete(link, kind) {
                Ok(DeleteOutcome::Removed) => report.deleted.push(link.to_path_buf()),
                Ok(DeleteOutcome::Missing) => report.missing.push(link.to_path_buf()),
                Err(LinkError::Store(err)) => return Err(store_failed(err)),
                Err(e) => {
                    tracing::error!(%kind, %identity, link = %link.display(), error = %e, "could not delete link");
                    report.failures.push(Failure {
                        operation: Operation::Delete,
                        subject: link.display().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report.finished_at = self.ctx.clock.now();
        tracing::info!(
            %kind,
            created = report.created.len(),
            kept = report.kept,
            deleted = report.deleted.len(),
            missing = report.missing.len(),
            failed = report.failures.len(),
            "pass complete"
        );
        Ok(report)
    }

    /// Plans a pass without creating, deleting or persisting anything.
    ///
    /// Without a store file the tree is scanned as in recovery, but the
    /// result is not written.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the store cannot be read.
    pub async fn plan(
        &self,
        kind: MediaKind,
        trending: &[TrendingItem],
    ) -> Result<Vec<LinkAction>, SyncError> {
        let store_failed = |source: StoreError| SyncError::Store { kind, source };
        let existing = match self.store.read(kind).map_err(store_failed)? {
            Some(state) => state,
            None => self.store.rebuild(kind).await.map_err(store_failed)?.0,
        };
        let wanted = TrendingSet::new(trending);
        let mut actions = Vec::new();

        for item in &wanted.ordered {
            let identity = item.identity.clone();
            if let Some(link) = existing.link_for(&identity) {
                if !self.config.verify_links || self.ctx.fs.is_live_link(link) {
                    actions.push(LinkAction::Keep { identity, link: link.to_path_buf() });
                    continue;
                }
            }
            let planned = match self.resolver.resolve(&identity, kind).await {
                Ok(source) => self.operator.link_path_for(&source, kind).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            actions.push(match planned {
                Ok(link) => LinkAction::Create { identity, title: item.title.clone(), link },
                Err(reason) => LinkAction::Unresolved { identity, title: item.title.clone(), reason },
            });
        }

        actions.extend(stale_records(&existing, &wanted));
        Ok(actions)
    }

    /// Drops every record whose link is missing or no longer reaches its
    /// target, removing broken links from disk as well.
    ///
    /// Returns the purged link paths. A broken link that cannot be removed
    /// is logged and keeps its record.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the store cannot be read or written.
    pub fn repair(&self, kind: MediaKind) -> Result<Vec<PathBuf>, SyncError> {
        let store_failed = |source: StoreError| SyncError::Store { kind, source };
        let Some(state) = self.store.read(kind).map_err(store_failed)? else {
            return Ok(Vec::new());
        };
        let dead: Vec<PathBuf> = state
            .records()
            .filter(|(link, _)| !self.ctx.fs.is_live_link(link))
            .map(|(link, _)| link.to_path_buf())
            .collect();

        let mut purged = Vec::with_capacity(dead.len());
        for link in dead {
            tracing::info!(%kind, link = %link.display(), "purging record of dead link");
            match self.operator.delete(&link, kind) {
                Ok(_) => purged.push(link),
                Err(LinkError::Store(err)) => return Err(store_failed(err)),
                Err(e) => {
                    tracing::error!(%kind, link = %link.display(), error = %e, "could not remove broken link");
                }
            }
        }
        Ok(purged)
    }
}

fn stale_records(existing: &LinkState, wanted: &TrendingSet<'_>) -> Vec<LinkAction> {
    existing
        .records()
        .filter(|(_, identity)| !wanted.contains(identity))
        .map(|(link, identity)| LinkAction::Delete {
            identity: identity.clone(),
            link: link.to_path_buf(),
        })
        .collect()
}

/// Formats planned actions as a human-readable report.
#[must_use]
pub fn format_actions(kind: MediaKind, actions: &[LinkAction]) -> String {
    if actions.is_empty() {
        return format!("{kind}: nothing to do.");
    }

    let mut lines = vec![format!("{kind}:")];
    for action in actions {
        lines.push(match action {
            LinkAction::Create { identity, title, link } => {
                format!("  CREATE {identity} ({title}): {}", link.display())
            }
            LinkAction::Keep { identity, link } => format!("  KEEP {identity}: {}", link.display()),
            LinkAction::Delete { identity, link } => {
                format!("  DELETE {identity}: {}", link.display())
            }
            LinkAction::Unresolved { identity, title, reason } => {
                format!("  SKIP {identity} ({title}): {reason}")
            }
        });
    }
    lines.join("\n")
}

/// Formats a pass report as a human-readable summary.
#[must_use]
pub fn format_report(report: &PassReport) -> String {
    let elapsed = (report.finished_at - report.started_at).num_milliseconds();
    let mut lines = vec![format!(
        "{}: {} trending, {} created, {} kept, {} deleted, {} missing, {} failed ({elapsed} ms)",
        report.kind,
        report.trending,
        report.created.len(),
        report.kept,
        report.deleted.len(),
        report.missing.len(),
        report.failures.len(),
    )];
    if let Some(rebuilt) = &report.rebuilt {
        lines.push(format!(
            "  store recovered from links: {} recovered, {} skipped",
            rebuilt.recovered,
            rebuilt.skipped.len()
        ));
    }
    lines.extend(report.created.iter().map(|(identity, link)| format!("  + {identity} {}", link.display())));
    lines.extend(report.deleted.iter().map(|link| format!("  - {}", link.display())));
    lines.extend(report.missing.iter().map(|link| format!("  ? {} (missing)", link.display())));
    lines.extend(report.failures.iter().map(|failure| {
        format!("  ! {:?} {}: {}", failure.operation, failure.subject, failure.message)
    }));
    lines.join("\n")
}
