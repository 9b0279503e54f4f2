use super::mods::Mod;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Game client detected from a process command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientType {
    Lunar,
    Forge,
    Labymod,
    Vanilla,
    Badlion,
    Feather,
}

/// Everything needed to relaunch a game client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinecraftInfo {
    pub client: ClientType,
    pub version: String,
    pub cmd: Vec<String>,
    pub cwd: String,
}

/// Named snapshot of the mods that were enabled when it was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModProfile {
    pub name: String,
    pub mods: Vec<Mod>,
}

impl ModProfile {
    /// Capture the enabled subset of `mods` under `name`.
    pub fn snapshot(name: impl Into<String>, mods: &[Mod]) -> Self {
        Self {
            name: name.into(),
            mods: mods.iter().filter(|m| !m.disabled).cloned().collect(),
        }
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.mods.iter().any(|m| m.file_name == file_name)
    }
}

/// A relaunchable client configuration, optionally owning a mod profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchProfile {
    pub name: String,
    pub mc_info: MinecraftInfo,
    pub mod_profile: Option<ModProfile>,
}

/// A persisted profile kind: one file per profile in `profiles/`.
pub trait Profile: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// File extension including the dot.
    const EXTENSION: &'static str;
    /// Human readable kind, used in logs.
    const KIND: &'static str;

    fn name(&self) -> &str;
}

impl Profile for ModProfile {
    const EXTENSION: &'static str = ".mprof";
    const KIND: &'static str = "mod profile";

    fn name(&self) -> &str {
        &self.name
    }
}

impl Profile for LaunchProfile {
    const EXTENSION: &'static str = ".lprof";
    const KIND: &'static str = "launch profile";

    fn name(&self) -> &str {
        &self.name
    }
}
