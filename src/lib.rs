// Weave Manager - local state synchronization core
//
// This is the library crate: the repository layer, the engines that mutate
// mods, profiles, process history and the loader, and the reactive store
// they publish to. The binary crate (main.rs) is a headless entry point.

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod models;
pub mod paths;
pub mod repository;
pub mod sanitize;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use context::{AppContext, Collaborators};
pub use error::{SyncError, SyncResult};
pub use models::{EngineConfig, LaunchProfile, Mod, ModProfile, Settings, SyncState};
pub use paths::{DirectoryKind, Layout};
pub use repository::Repository;
pub use state::{StateChange, StateStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
