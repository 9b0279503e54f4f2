use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration from `manager.yaml` and `WEAVE_MANAGER_*` variables.
///
/// Unlike [`Settings`](super::Settings), which the user edits through the
/// manager, this file tunes the engine itself: where the weave root lives,
/// how network calls behave and how logging is set up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Overrides `<home>/.weave` when set.
    pub root_dir: Option<Utf8PathBuf>,

    /// Latest-release endpoint for the loader.
    pub release_url: String,

    pub user_agent: String,

    /// Per-request timeout.
    pub network_timeout_secs: u64,

    /// Extra attempts after the first failed request.
    pub max_retries: u32,

    /// Base delay between retries; attempt `n` waits `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,

    /// Number of jar manifests read in parallel during a mod scan.
    pub manifest_concurrency: usize,

    pub debug_logging: bool,
    pub console_logging: bool,
    pub json_logs: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            release_url: "https://api.github.com/repos/Weave-MC/Weave-Loader/releases/latest"
                .to_string(),
            user_agent: "weave-manager".to_string(),
            network_timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
            manifest_concurrency: 8,
            debug_logging: false,
            console_logging: true,
            json_logs: false,
        }
    }
}

impl EngineConfig {
    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
