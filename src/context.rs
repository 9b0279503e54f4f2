//! Wires the repository, store and engines together for one weave root.

use crate::error::{SyncError, SyncResult};
use crate::models::{EngineConfig, LaunchProfile, ModProfile, Settings, SyncState};
use crate::paths::Layout;
use crate::repository::{JarManifestReader, ManifestReader, Repository, ScanIssue};
use crate::services::{
    GithubReleaseSource, IntegrityChecker, LoaderUpdate, ModToggleService, ProcessHistoryTracker,
    ProfileActivation, ProfileService, ReleaseSource, Sha256Integrity, UpdateService,
};
use crate::state::{StateChange, StateStore};
use std::sync::Arc;

/// External collaborators used by the engines.
pub struct Collaborators {
    pub manifests: Arc<dyn ManifestReader>,
    pub releases: Arc<dyn ReleaseSource>,
    pub integrity: Arc<dyn IntegrityChecker>,
}

impl Collaborators {
    /// Zip manifests, GitHub releases and SHA-256 of `loader.jar`.
    pub fn standard(config: &EngineConfig, layout: &Layout) -> SyncResult<Self> {
        Ok(Self {
            manifests: Arc::new(JarManifestReader),
            releases: Arc::new(GithubReleaseSource::new(config)?),
            integrity: Arc::new(Sha256Integrity::new(layout.loader_file())),
        })
    }
}

/// Everything the manager needs for one weave root.
///
/// Built by [`open`](Self::open), which creates the directory tree, reads
/// the current state from disk into the store and finishes any interrupted
/// loader install.
#[derive(Clone)]
pub struct AppContext {
    repository: Repository,
    store: StateStore,
    toggles: ModToggleService,
    activation: ProfileActivation,
    profiles: ProfileService,
    history: ProcessHistoryTracker,
    updates: UpdateService,
}

impl AppContext {
    pub async fn open(layout: Layout, config: &EngineConfig, collaborators: Collaborators) -> SyncResult<Self> {
        layout.ensure_all().await?;

        let repository = Repository::new(layout, collaborators.manifests)
            .with_manifest_concurrency(config.manifest_concurrency);
        let store = StateStore::new();

        let toggles = ModToggleService::new(repository.clone(), store.clone());
        let context = Self {
            activation: ProfileActivation::new(toggles.clone(), store.clone()),
            profiles: ProfileService::new(repository.clone(), store.clone()),
            history: ProcessHistoryTracker::new(repository.clone(), store.clone()),
            updates: UpdateService::new(
                repository.clone(),
                store.clone(),
                collaborators.releases,
                collaborators.integrity,
            ),
            toggles,
            repository,
            store,
        };

        context.load_initial_state().await?;
        if let Err(e) = context.updates.recover_pending_install().await {
            tracing::warn!("Could not recover interrupted install: {}", e);
        }

        tracing::info!("Opened weave root {}", context.repository.layout().root());
        Ok(context)
    }

    async fn load_initial_state(&self) -> SyncResult<()> {
        let settings = match self.repository.read_settings().await {
            Ok(settings) => settings,
            Err(e @ SyncError::Parse { .. }) => {
                tracing::warn!("Settings unreadable, using defaults in memory: {}", e);
                Settings::default()
            }
            Err(e) => return Err(e),
        };
        let process_history = match self.repository.read_process_history().await {
            Ok(history) => history,
            Err(e @ SyncError::Parse { .. }) => {
                tracing::warn!("Process history unreadable, starting empty in memory: {}", e);
                Default::default()
            }
            Err(e) => return Err(e),
        };

        let mods = self.repository.read_mods().await?;
        let agents = self.repository.read_agents().await?;
        let mod_profiles = self.repository.read_profiles::<ModProfile>().await?;
        let launch_profiles = self.repository.read_profiles::<LaunchProfile>().await?;

        let mut issues = Vec::new();
        issues.extend(mods.issues);
        issues.extend(agents.issues);
        issues.extend(mod_profiles.issues);
        issues.extend(launch_profiles.issues);

        self.store.update(|state| {
            *state = SyncState {
                mods: mods.items,
                agents: agents.items,
                mod_profiles: mod_profiles.items,
                launch_profiles: launch_profiles.items,
                process_history,
                settings,
                ..SyncState::default()
            };
        });
        self.publish_issues(issues);
        Ok(())
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn toggles(&self) -> &ModToggleService {
        &self.toggles
    }

    pub fn activation(&self) -> &ProfileActivation {
        &self.activation
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn history(&self) -> &ProcessHistoryTracker {
        &self.history
    }

    pub fn updates(&self) -> &UpdateService {
        &self.updates
    }

    /// Re-scan `mods/` and replace the store's mod list.
    ///
    /// Toggles wait while the scan runs, so the published list matches disk.
    pub async fn refresh_mods(&self) -> SyncResult<usize> {
        let _catalog = self.repository.exclusive_catalog().await;
        let report = self.repository.read_mods().await?;
        let count = report.items.len();
        self.store.update(|state| state.mods = report.items);
        self.publish_issues(report.issues);
        Ok(count)
    }

    /// Re-scan `agents/` and replace the store's agent list.
    pub async fn refresh_agents(&self) -> SyncResult<usize> {
        let _catalog = self.repository.exclusive_catalog().await;
        let report = self.repository.read_agents().await?;
        let count = report.items.len();
        self.store.update(|state| state.agents = report.items);
        self.publish_issues(report.issues);
        Ok(count)
    }

    pub async fn refresh_profiles(&self) -> SyncResult<()> {
        let issues = self.profiles.reload().await?;
        self.publish_issues(issues);
        Ok(())
    }

    /// Persist a settings change, then publish it.
    ///
    /// An unreadable settings file is replaced, starting from the settings
    /// the store is using.
    pub async fn update_settings<F>(&self, apply: F) -> SyncResult<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let current = self.store.read(|state| state.settings.clone());
        let settings = self.repository.update_settings_over(&current, apply).await?;
        let published = settings.clone();
        self.store.update(|state| state.settings = published);
        Ok(settings)
    }

    /// First-run install: write analytics once, then fetch and install the
    /// latest loader if the installed one is missing or stale.
    pub async fn install(&self) -> SyncResult<LoaderUpdate> {
        if self.repository.write_analytics_once().await? {
            tracing::info!("First install, analytics initialized");
        }

        let update = self.updates.check_for_update().await?;
        if update.update {
            self.updates.download_and_install(&update).await?;
        }
        Ok(update)
    }

    /// Startup update step, driven by settings.
    ///
    /// Skipped when `ignore_updates` is set; installs when `auto_update` is
    /// set; otherwise only checks. A failure is logged and left in the
    /// store as [`UpdateStatus::Unavailable`](crate::models::UpdateStatus)
    /// rather than returned, so an offline start still comes up.
    pub async fn startup_update(&self) -> Option<LoaderUpdate> {
        let settings = self.store.read(|state| state.settings.clone());
        if settings.ignore_updates {
            tracing::info!("Update checks disabled in settings");
            return None;
        }

        let result = if settings.auto_update {
            self.install().await
        } else {
            self.updates.check_for_update().await
        };
        match result {
            Ok(update) => Some(update),
            Err(e) => {
                tracing::warn!("Loader update unavailable: {}", e);
                None
            }
        }
    }

    /// Tell subscribers the context is going away.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down");
        self.store.publish(StateChange::Shutdown);
    }

    fn publish_issues(&self, issues: Vec<ScanIssue>) {
        for issue in issues {
            self.store.publish(StateChange::ScanIssue {
                path: issue.path.to_string(),
                message: issue.error.to_string(),
            });
        }
    }
}
