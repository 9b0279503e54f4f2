use serde::{Deserialize, Serialize};

/// Manager settings persisted in `manager.settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub auto_update: bool,

    #[serde(default)]
    pub ignore_updates: bool,

    #[serde(default = "default_true")]
    pub startup_run: bool,

    #[serde(default)]
    pub compact_buttons: bool,

    #[serde(default = "default_theme")]
    pub theme: String,

    /// Release tag of the installed loader, if one was installed by us.
    #[serde(default)]
    pub loader_version: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_update: true,
            ignore_updates: false,
            startup_run: true,
            compact_buttons: false,
            theme: default_theme(),
            loader_version: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_theme() -> String {
    "theme-darcula".to_string()
}

/// Usage counters written once at install time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub launch_times: Vec<u32>,
    pub time_played: u64,
    pub average_launch_time: f32,
}
