//! Typed persistence for everything under the weave root.
//!
//! The repository owns the on-disk format (compact JSON, one file per
//! entity) and the file layout from [`Layout`]. It never touches the
//! in-memory store; engines publish after the repository reports success.
//!
//! # Concurrency
//!
//! Every write or rename takes the async lock for its target path first
//! (see [`Repository::lock`]), so at most one mutation per file is in flight.
//! Writes go to a hidden sibling temp file and are renamed into place.
//!
//! Mutations that publish into the store also hold the catalog lock in
//! shared mode for their whole duration ([`Repository::share_catalog`]).
//! A rescan that replaces a store list holds it exclusively
//! ([`Repository::exclusive_catalog`]) from the directory listing until it
//! has published, so it can never publish a listing that a mutation has
//! already made stale. Order is always catalog first, then path locks.
//!
//! # Partial failure
//!
//! Directory scans return a [`ScanReport`]: one unreadable file becomes a
//! [`ScanIssue`] and the rest of the batch is still returned.

pub mod manifest;
pub mod profiles;
pub mod scan;
pub mod singletons;

pub use manifest::{JarManifestReader, ManifestReader};
pub use singletons::PendingInstall;

use crate::error::{SyncError, SyncResult};
use crate::paths::Layout;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// One file that could not be read during a directory scan.
#[derive(Debug)]
pub struct ScanIssue {
    pub path: Utf8PathBuf,
    pub error: SyncError,
}

/// Result of a directory scan that tolerates per-file failures.
#[derive(Debug)]
pub struct ScanReport<T> {
    pub items: T,
    pub issues: Vec<ScanIssue>,
}

impl<T> ScanReport<T> {
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

/// One async mutex per file path.
#[derive(Debug, Default)]
struct PathLocks {
    locks: Mutex<HashMap<Utf8PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl PathLocks {
    async fn lock(&self, path: &Utf8Path) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(path.to_path_buf()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Typed read/write access to mods, agents, profiles and singletons.
///
/// Cheap to clone; clones share path locks and the manifest reader.
#[derive(Clone)]
pub struct Repository {
    layout: Layout,
    locks: Arc<PathLocks>,
    catalog: Arc<RwLock<()>>,
    manifests: Arc<dyn ManifestReader>,
    manifest_concurrency: usize,
}

impl Repository {
    pub fn new(layout: Layout, manifests: Arc<dyn ManifestReader>) -> Self {
        Self {
            layout,
            locks: Arc::new(PathLocks::default()),
            catalog: Arc::new(RwLock::new(())),
            manifests,
            manifest_concurrency: 8,
        }
    }

    pub fn with_manifest_concurrency(mut self, n: usize) -> Self {
        self.manifest_concurrency = n.max(1);
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Exclusive access to `path` until the guard is dropped.
    ///
    /// Not reentrant: never call a locking repository method for the same
    /// path while holding its guard.
    pub async fn lock(&self, path: &Utf8Path) -> OwnedMutexGuard<()> {
        self.locks.lock(path).await
    }

    /// Held by store-publishing mutations; any number may run at once.
    ///
    /// Take it once per operation, before any path lock. Taking it again
    /// while a rescan is queued deadlocks.
    pub async fn share_catalog(&self) -> OwnedRwLockReadGuard<()> {
        Arc::clone(&self.catalog).read_owned().await
    }

    /// Held by a rescan from listing to publishing.
    pub async fn exclusive_catalog(&self) -> OwnedRwLockWriteGuard<()> {
        Arc::clone(&self.catalog).write_owned().await
    }
}

/// Hidden sibling used while writing `path`.
fn temp_sibling(path: &Utf8Path, tag: &str) -> Utf8PathBuf {
    let name = path.file_name().unwrap_or("entity");
    path.with_file_name(format!(".{name}.{tag}"))
}

/// Write `contents` to a temp file next to `path`, then rename it over `path`.
pub(crate) async fn write_atomic(path: &Utf8Path, contents: &[u8]) -> SyncResult<()> {
    let tmp = temp_sibling(path, "tmp");
    tokio::fs::write(&tmp, contents)
        .await
        .map_err(|e| SyncError::io(&tmp, e))?;

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(SyncError::io(path, e));
    }
    Ok(())
}

pub(crate) async fn write_json<T: Serialize>(path: &Utf8Path, value: &T) -> SyncResult<()> {
    let bytes = serde_json::to_vec(value).map_err(|e| SyncError::parse(path, e))?;
    write_atomic(path, &bytes).await
}

pub(crate) async fn exists(path: &Utf8Path) -> SyncResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| SyncError::io(path, e))
}
