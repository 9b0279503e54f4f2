use crate::error::{SyncError, SyncResult};
use crate::models::{Agent, Mod, SyncState, Toggleable};
use crate::repository::{Repository, exists};
use crate::state::StateStore;

/// Enables and disables mods and agents by renaming their files.
///
/// The rename happens first; the store is only touched once it succeeded.
/// Operations on the same identity are serialized by the repository's path
/// lock, and the direction of a flip is decided from the store while that
/// lock is held, so two concurrent toggles of one mod always net out.
#[derive(Clone)]
pub struct ModToggleService {
    repository: Repository,
    store: StateStore,
}

impl ModToggleService {
    pub fn new(repository: Repository, store: StateStore) -> Self {
        Self { repository, store }
    }

    /// Flip a mod's enabled state. Returns the updated mod.
    pub async fn toggle_mod(&self, target: &Mod) -> SyncResult<Mod> {
        let flipped = self
            .flip(target, |current: &Mod| !current.is_disabled(), find_mod, replace_mod)
            .await?;
        flipped.ok_or_else(|| SyncError::NotFound(target.file_name.clone()))
    }

    /// Bring a mod to the requested state. `None` when it already was.
    pub async fn set_mod_enabled(&self, target: &Mod, enabled: bool) -> SyncResult<Option<Mod>> {
        self.flip(target, |_: &Mod| !enabled, find_mod, replace_mod)
            .await
    }

    /// Flip an agent's enabled state. Returns the updated agent.
    pub async fn toggle_agent(&self, target: &Agent) -> SyncResult<Agent> {
        let flipped = self
            .flip(target, |current: &Agent| !current.is_disabled(), find_agent, replace_agent)
            .await?;
        flipped.ok_or_else(|| SyncError::NotFound(target.file_name.clone()))
    }

    async fn flip<T, W, F, R>(
        &self,
        target: &T,
        want_disabled: W,
        find: F,
        replace: R,
    ) -> SyncResult<Option<T>>
    where
        T: Toggleable,
        W: FnOnce(&T) -> bool,
        F: Fn(&SyncState, &str) -> Option<T>,
        R: FnOnce(&mut SyncState, T) -> bool,
    {
        let id = target.identity();
        let _catalog = self.repository.share_catalog().await;

        // Lock on the known entry's path, not the caller's copy, which may be stale
        let key = self
            .store
            .read(|state| find(state, id))
            .map(|known| known.file_path().to_path_buf())
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        let _guard = self.repository.lock(&key).await;

        let current = self
            .store
            .read(|state| find(state, id))
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;

        let disabled = want_disabled(&current);
        if disabled == current.is_disabled() {
            return Ok(None);
        }

        let updated = current.with_disabled(disabled);
        let from = current.disk_path();
        let to = updated.disk_path();

        if exists(&to).await? {
            tracing::error!("Cannot rename {} onto existing {}", from, to);
            return Err(SyncError::AlreadyExists { path: to });
        }
        tokio::fs::rename(&from, &to).await.map_err(|e| {
            tracing::error!("Rename {} -> {} failed: {}", from, to, e);
            SyncError::io(&from, e)
        })?;

        let published = updated.clone();
        self.store.update(move |state| {
            replace(state, published);
        });

        tracing::info!(
            "{} {}",
            if disabled { "Disabled" } else { "Enabled" },
            updated.identity()
        );
        Ok(Some(updated))
    }
}

fn find_mod(state: &SyncState, id: &str) -> Option<Mod> {
    state.find_mod(id).cloned()
}

fn replace_mod(state: &mut SyncState, m: Mod) -> bool {
    state.replace_mod(m)
}

fn find_agent(state: &SyncState, id: &str) -> Option<Agent> {
    state.find_agent(id).cloned()
}

fn replace_agent(state: &mut SyncState, a: Agent) -> bool {
    state.replace_agent(a)
}
