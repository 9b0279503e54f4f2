//! Weave Manager - headless entry point.
//!
//! # Execution Flow
//!
//! 1. Load `manager.yaml` and `WEAVE_MANAGER_*` overrides from `~/.weave`
//! 2. Initialize logging → `<root>/logs/weave-manager.<date>`
//! 3. Create tokio runtime
//! 4. Open the [`AppContext`]: create directories, read mods, agents,
//!    profiles, settings and history, recover an interrupted install
//! 5. Log a summary and, unless updates are ignored, check for a loader
//!    update (installing it when `auto_update` is on). An unreachable
//!    release server is logged, not fatal
//! 6. Shutdown tokio runtime with 5s timeout

use anyhow::{Context, Result};
use weave_manager::{APP_NAME, AppContext, Collaborators, ConfigManager, DirectoryKind, Layout, VERSION};

fn main() -> Result<()> {
    let home = Layout::from_home().context("Failed to locate the weave directory")?;
    let config_manager = ConfigManager::new(home.root())?;
    let config = config_manager.load_engine_config()?;

    let layout = match &config.root_dir {
        Some(root) => Layout::new(root.clone()),
        None => home,
    };

    let _log_guard = weave_manager::logging::setup_logging(
        &layout.path_of(DirectoryKind::Logs),
        APP_NAME,
        config.debug_logging,
        config.console_logging,
        config.json_logs,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .thread_name("weave-worker")
        .build()?;

    let result = runtime.block_on(async {
        let collaborators = Collaborators::standard(&config, &layout)?;
        let context = AppContext::open(layout, &config, collaborators).await?;

        let state = context.store().snapshot();
        tracing::info!(
            "Mods: {}/{} enabled, agents: {}, mod profiles: {}, launch profiles: {}, history: {}",
            state.enabled_mods().len(),
            state.mods.len(),
            state.agents.len(),
            state.mod_profiles.len(),
            state.launch_profiles.len(),
            state.process_history.history.len()
        );

        match context.startup_update().await {
            Some(update) if update.update && !state.settings.auto_update => {
                tracing::info!("Loader {} is available at {}", update.version, update.download_url);
            }
            Some(update) => tracing::info!("Loader {} ready", update.version),
            None => {}
        }

        context.shutdown();
        anyhow::Ok(())
    });

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Shutdown complete");

    result.inspect_err(|e| tracing::error!("Fatal error: {:#}", e))
}
