use super::{Agent, LaunchProfile, MinecraftProcess, Mod, ModProfile, ProcessHistory, Settings};
use indexmap::IndexMap;

/// Outcome of the last loader update check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UpdateStatus {
    #[default]
    Unknown,
    Checking,
    UpToDate {
        version: String,
    },
    Available {
        version: String,
        download_url: String,
    },
    Installed {
        version: String,
    },
    /// The check failed; callers may retry.
    Unavailable {
        reason: String,
    },
}

/// In-memory view of everything the manager keeps on disk.
///
/// Owned by [`crate::state::StateStore`]; never mutate a copy and expect it
/// to be persisted. Profile maps are keyed by sanitized file stem.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncState {
    pub mods: Vec<Mod>,
    pub agents: Vec<Agent>,

    pub mod_profiles: IndexMap<String, ModProfile>,
    pub launch_profiles: IndexMap<String, LaunchProfile>,

    /// Processes seen in the last scan, keyed by pid.
    pub processes: IndexMap<u32, MinecraftProcess>,
    pub process_history: ProcessHistory,

    pub settings: Settings,
    pub update_status: UpdateStatus,
}

impl SyncState {
    pub fn enabled_mods(&self) -> Vec<Mod> {
        self.mods.iter().filter(|m| !m.disabled).cloned().collect()
    }

    pub fn find_mod(&self, file_name: &str) -> Option<&Mod> {
        self.mods.iter().find(|m| m.file_name == file_name)
    }

    pub fn find_agent(&self, file_name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.file_name == file_name)
    }

    /// Replace the mod with the same identity. Returns false if absent.
    pub fn replace_mod(&mut self, updated: Mod) -> bool {
        match self.mods.iter_mut().find(|m| m.file_name == updated.file_name) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    pub fn replace_agent(&mut self, updated: Agent) -> bool {
        match self.agents.iter_mut().find(|a| a.file_name == updated.file_name) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }
}
