use crate::error::SyncResult;
use crate::models::{LaunchProfile, MinecraftInfo, Mod, ModProfile};
use crate::repository::{Repository, ScanIssue};
use crate::state::StateStore;

/// Profile lifecycle: every operation persists first, then publishes the
/// result into the store's profile maps.
///
/// Mutations share the repository catalog lock and [`reload`](Self::reload)
/// holds it exclusively, so a reload never publishes maps that miss a
/// create or resurrect a delete that finished while it was reading.
#[derive(Clone)]
pub struct ProfileService {
    repository: Repository,
    store: StateStore,
}

impl ProfileService {
    pub fn new(repository: Repository, store: StateStore) -> Self {
        Self { repository, store }
    }

    /// Create a mod profile from the enabled subset of `mods`.
    pub async fn create_mod_profile(&self, name: &str, mods: &[Mod]) -> SyncResult<ModProfile> {
        let _catalog = self.repository.share_catalog().await;
        let profile = ModProfile::snapshot(name, mods);
        let key = self.repository.create_profile(&profile).await?;
        self.publish_mod_profile(key, profile.clone());
        Ok(profile)
    }

    /// Create a mod profile from the mods enabled right now.
    pub async fn capture_mod_profile(&self, name: &str) -> SyncResult<ModProfile> {
        let mods = self.store.read(|state| state.enabled_mods());
        self.create_mod_profile(name, &mods).await
    }

    pub async fn create_launch_profile(
        &self,
        name: &str,
        mc_info: MinecraftInfo,
        mod_profile: Option<ModProfile>,
    ) -> SyncResult<LaunchProfile> {
        let _catalog = self.repository.share_catalog().await;
        let profile = LaunchProfile {
            name: name.to_string(),
            mc_info,
            mod_profile,
        };
        let key = self.repository.create_profile(&profile).await?;
        self.store.update(|state| {
            state.launch_profiles.insert(key, profile.clone());
            state.launch_profiles.sort_keys();
        });
        Ok(profile)
    }

    pub async fn save_mod_profile(&self, profile: &ModProfile) -> SyncResult<()> {
        let _catalog = self.repository.share_catalog().await;
        let key = self.repository.save_profile(profile).await?;
        self.publish_mod_profile(key, profile.clone());
        Ok(())
    }

    /// Save a launch profile and its embedded mod profile as one unit.
    pub async fn save_launch_profile(&self, profile: &LaunchProfile) -> SyncResult<()> {
        let _catalog = self.repository.share_catalog().await;
        let key = self.repository.save_launch_profile(profile).await?;

        let mod_entry = match &profile.mod_profile {
            Some(mp) => Some((self.repository.profile_location::<ModProfile>(&mp.name)?.0, mp.clone())),
            None => None,
        };
        self.store.update(|state| {
            if let Some((mod_key, mp)) = mod_entry {
                state.mod_profiles.insert(mod_key, mp);
                state.mod_profiles.sort_keys();
            }
            state.launch_profiles.insert(key, profile.clone());
            state.launch_profiles.sort_keys();
        });
        Ok(())
    }

    pub async fn delete_mod_profile(&self, profile: &ModProfile) -> SyncResult<()> {
        let _catalog = self.repository.share_catalog().await;
        let key = self.repository.delete_profile(profile).await?;
        self.store.update(|state| {
            state.mod_profiles.shift_remove(&key);
        });
        Ok(())
    }

    pub async fn delete_launch_profile(&self, profile: &LaunchProfile) -> SyncResult<()> {
        let _catalog = self.repository.share_catalog().await;
        let key = self.repository.delete_profile(profile).await?;
        self.store.update(|state| {
            state.launch_profiles.shift_remove(&key);
        });
        Ok(())
    }

    /// Re-read both profile kinds from disk and replace the store maps.
    ///
    /// Returns the files that could not be read.
    pub async fn reload(&self) -> SyncResult<Vec<ScanIssue>> {
        let _catalog = self.repository.exclusive_catalog().await;
        let mod_profiles = self.repository.read_profiles::<ModProfile>().await?;
        let launch_profiles = self.repository.read_profiles::<LaunchProfile>().await?;

        let mut issues = mod_profiles.issues;
        issues.extend(launch_profiles.issues);

        self.store.update(|state| {
            state.mod_profiles = mod_profiles.items;
            state.launch_profiles = launch_profiles.items;
        });
        Ok(issues)
    }

    fn publish_mod_profile(&self, key: String, profile: ModProfile) {
        self.store.update(|state| {
            state.mod_profiles.insert(key, profile);
            state.mod_profiles.sort_keys();
        });
    }
}
