//! Loader update check and install.
//!
//! The check looks at the latest release, picks its first `.jar` asset and
//! the `<asset>.sha256` sidecar next to it, and compares that checksum with
//! the installed `loader.jar`. Installing verifies the downloaded bytes
//! against the same checksum before anything is written.
//!
//! An install touches two files (`loader.jar`, then `manager.settings`). A
//! `loader.pending` marker is written first and removed last; if the process
//! dies in between, [`UpdateService::recover_pending_install`] finishes or
//! discards the install on the next start.

use super::integrity::{IntegrityChecker, checksums_equal, sha256_bytes, sha256_file};
use super::release::ReleaseSource;
use crate::error::{SyncError, SyncResult};
use crate::models::UpdateStatus;
use crate::paths::DirectoryKind;
use crate::repository::{PendingInstall, Repository};
use crate::state::StateStore;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;

const CHECKSUM_SUFFIX: &str = ".sha256";

/// Result of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderUpdate {
    /// The installed artifact is missing or differs from the release.
    pub update: bool,
    pub download_url: String,
    pub version: String,
    /// Uppercase hex SHA-256 published with the release.
    pub checksum: String,
}

#[derive(Clone)]
pub struct UpdateService {
    repository: Repository,
    store: StateStore,
    releases: Arc<dyn ReleaseSource>,
    integrity: Arc<dyn IntegrityChecker>,
}

impl UpdateService {
    pub fn new(
        repository: Repository,
        store: StateStore,
        releases: Arc<dyn ReleaseSource>,
        integrity: Arc<dyn IntegrityChecker>,
    ) -> Self {
        Self {
            repository,
            store,
            releases,
            integrity,
        }
    }

    /// Ask the release source whether the installed loader is current.
    ///
    /// Failures are returned and recorded as [`UpdateStatus::Unavailable`];
    /// they never look like "no update".
    pub async fn check_for_update(&self) -> SyncResult<LoaderUpdate> {
        let checking = CheckingGuard::begin(&self.store);

        match self.resolve_update().await {
            Ok(update) => {
                let status = if update.update {
                    UpdateStatus::Available {
                        version: update.version.clone(),
                        download_url: update.download_url.clone(),
                    }
                } else {
                    UpdateStatus::UpToDate {
                        version: update.version.clone(),
                    }
                };
                tracing::info!(
                    "Loader {}: {}",
                    update.version,
                    if update.update { "update available" } else { "up to date" }
                );
                checking.finish(status);
                Ok(update)
            }
            Err(e) => {
                tracing::error!("Update check failed: {}", e);
                checking.finish(UpdateStatus::Unavailable {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn resolve_update(&self) -> SyncResult<LoaderUpdate> {
        let release = self.releases.latest_release().await?;

        let asset = release
            .assets
            .iter()
            .find(|a| a.name.ends_with(".jar"))
            .ok_or_else(|| SyncError::NotFound(format!("jar asset in release {}", release.tag_name)))?;

        let sidecar_name = format!("{}{}", asset.name, CHECKSUM_SUFFIX);
        let sidecar = release.asset(&sidecar_name).ok_or_else(|| {
            SyncError::Integrity(format!(
                "release {} has no {}",
                release.tag_name, sidecar_name
            ))
        })?;

        let text = self.releases.fetch_text(&sidecar.browser_download_url).await?;
        let checksum = parse_checksum(&text)?;
        let matches = self.integrity.matches(&checksum).await?;

        Ok(LoaderUpdate {
            update: !matches,
            download_url: asset.browser_download_url.clone(),
            version: release.tag_name.clone(),
            checksum,
        })
    }

    /// Download, verify and install the loader, then record its version.
    ///
    /// Nothing is written if the download fails or its checksum is wrong.
    /// Dropping the returned future mid-install leaves no partial artifact.
    pub async fn download_and_install(&self, update: &LoaderUpdate) -> SyncResult<()> {
        let bytes = self.releases.fetch_bytes(&update.download_url).await?;

        let actual = sha256_bytes(&bytes);
        if !checksums_equal(&actual, &update.checksum) {
            tracing::error!(
                "Checksum mismatch for {}: expected {}, got {}",
                update.download_url,
                update.checksum,
                actual
            );
            return Err(SyncError::Integrity(format!(
                "expected {}, got {}",
                update.checksum, actual
            )));
        }

        let layout = self.repository.layout();
        layout.resolve(DirectoryKind::Root).await?;
        let loader = layout.loader_file();

        {
            let _guard = self.repository.lock(&loader).await;
            self.repository
                .write_pending_install(&PendingInstall {
                    version: update.version.clone(),
                    checksum: actual,
                })
                .await?;

            if let Err(e) = replace_artifact(&loader, &bytes).await {
                if let Err(clear_err) = self.repository.clear_pending_install().await {
                    tracing::warn!("Could not clear install marker: {}", clear_err);
                }
                return Err(e);
            }
        }

        let version = update.version.clone();
        let current = self.store.read(|state| state.settings.clone());
        let settings = self
            .repository
            .update_settings_over(&current, |s| s.loader_version = Some(version))
            .await?;
        self.store.update(|state| {
            state.settings = settings;
            state.update_status = UpdateStatus::Installed {
                version: update.version.clone(),
            };
        });
        self.repository.clear_pending_install().await?;

        tracing::info!("Installed loader {} to {}", update.version, loader);
        Ok(())
    }

    /// Finish or discard an install interrupted between writing the
    /// artifact and recording it in settings.
    ///
    /// Returns the version that was recorded, if any.
    pub async fn recover_pending_install(&self) -> SyncResult<Option<String>> {
        let Some(pending) = self.repository.read_pending_install().await? else {
            return Ok(None);
        };

        let loader = self.repository.layout().loader_file();
        let installed = match sha256_file(&loader).await {
            Ok(actual) => checksums_equal(&actual, &pending.checksum),
            Err(SyncError::NotFound(_)) => false,
            Err(e) => return Err(e),
        };

        let recovered = if installed {
            let version = pending.version.clone();
            let current = self.store.read(|state| state.settings.clone());
            let settings = self
                .repository
                .update_settings_over(&current, |s| s.loader_version = Some(version))
                .await?;
            self.store.update(|state| state.settings = settings);
            tracing::info!("Recovered interrupted install of loader {}", pending.version);
            Some(pending.version)
        } else {
            tracing::warn!(
                "Discarding interrupted install of loader {}: artifact does not match",
                pending.version
            );
            None
        };

        self.repository.clear_pending_install().await?;
        Ok(recovered)
    }
}

/// Removes a temp file on drop unless disarmed.
struct TempFileGuard {
    path: Option<Utf8PathBuf>,
}

impl TempFileGuard {
    fn new(path: Utf8PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn disarm(&mut self) {
        self.path = None;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = std::fs::remove_file(&path);
        }
    }
}

/// Holds the store at [`UpdateStatus::Checking`]; puts the previous status
/// back on drop if the check never finished.
struct CheckingGuard<'a> {
    store: &'a StateStore,
    previous: Option<UpdateStatus>,
}

impl<'a> CheckingGuard<'a> {
    fn begin(store: &'a StateStore) -> Self {
        let previous = store.read(|state| state.update_status.clone());
        store.set_update_status(UpdateStatus::Checking);
        Self {
            store,
            previous: Some(previous),
        }
    }

    fn finish(mut self, status: UpdateStatus) {
        self.previous = None;
        self.store.set_update_status(status);
    }
}

impl Drop for CheckingGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            tracing::debug!("Update check cancelled");
            self.store.set_update_status(previous);
        }
    }
}

async fn replace_artifact(target: &Utf8Path, bytes: &[u8]) -> SyncResult<()> {
    let name = target.file_name().unwrap_or("loader.jar");
    let tmp = target.with_file_name(format!(".{name}.download"));
    let mut guard = TempFileGuard::new(tmp.clone());

    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| SyncError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, target)
        .await
        .map_err(|e| SyncError::io(target, e))?;

    guard.disarm();
    Ok(())
}

/// First whitespace-separated token of a `.sha256` sidecar, uppercased.
pub fn parse_checksum(text: &str) -> SyncResult<String> {
    let token = text
        .split_whitespace()
        .next()
        .ok_or_else(|| SyncError::Integrity("checksum file is empty".to_string()))?;

    if !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SyncError::Integrity(format!("malformed checksum '{}'", token)));
    }
    Ok(token.to_uppercase())
}
