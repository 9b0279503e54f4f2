//! Data models for the weave manager core.
//!
//! - [`Mod`] / [`Agent`]: jars discovered in `mods/` and `agents/`, enabled state
//!   encoded by the [`DISABLED_SUFFIX`]
//! - [`ModProfile`] / [`LaunchProfile`]: named profiles persisted in `profiles/`
//! - [`MinecraftProcess`] / [`ProcessHistory`]: observed game processes
//! - [`Settings`] / [`Analytics`]: singletons in the weave root
//! - [`EngineConfig`]: engine tuning loaded by [`crate::config::ConfigManager`]
//! - [`SyncState`]: the in-memory view held by [`crate::state::StateStore`]

pub mod app_state;
pub mod config;
pub mod mods;
pub mod process;
pub mod profile;
pub mod settings;

pub use app_state::{SyncState, UpdateStatus};
pub use config::EngineConfig;
pub use mods::{Agent, DISABLED_SUFFIX, JAR_MARKER, Mod, ModInfo, Toggleable};
pub use process::{MinecraftProcess, ProcessHistory};
pub use profile::{ClientType, LaunchProfile, MinecraftInfo, ModProfile, Profile};
pub use settings::{Analytics, Settings};
