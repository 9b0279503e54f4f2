use crate::models::EngineConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::fs;

/// Prefix of environment variables that override `manager.yaml`.
pub const ENV_PREFIX: &str = "WEAVE_MANAGER";

/// File name of the engine configuration inside the config directory.
pub const ENGINE_CONFIG_FILE: &str = "manager.yaml";

/// Loads and saves [`EngineConfig`].
///
/// Sources, lowest priority first:
/// - built-in defaults
/// - `manager.yaml` in the config directory (optional)
/// - `WEAVE_MANAGER_*` environment variables, e.g. `WEAVE_MANAGER_MAX_RETRIES=5`
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    engine_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            engine_config_path: config_dir.join(ENGINE_CONFIG_FILE),
            config_dir,
        })
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn engine_config_path(&self) -> &Utf8Path {
        &self.engine_config_path
    }

    /// Load the engine configuration from all sources.
    pub fn load_engine_config(&self) -> Result<EngineConfig> {
        self.build(None)
    }

    /// Same as [`load_engine_config`](Self::load_engine_config) but reads
    /// overrides from `vars` instead of the process environment.
    ///
    /// Keys are full variable names, e.g. `WEAVE_MANAGER_JSON_LOGS`.
    pub fn load_engine_config_with_env(&self, vars: HashMap<String, String>) -> Result<EngineConfig> {
        self.build(Some(vars))
    }

    fn build(&self, vars: Option<HashMap<String, String>>) -> Result<EngineConfig> {
        if !self.engine_config_path.exists() {
            tracing::debug!(
                "Engine config not found at {}, using defaults",
                self.engine_config_path
            );
        }

        let settings = Config::builder()
            .add_source(File::new(self.engine_config_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .with_context(|| format!("Failed to read engine config: {}", self.engine_config_path))?;

        let config: EngineConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse engine config: {}", self.engine_config_path))?;

        tracing::info!("Loaded engine config from {}", self.config_dir);
        Ok(config)
    }

    /// Save the engine configuration as YAML.
    pub fn save_engine_config(&self, config: &EngineConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize engine config to YAML")?;

        fs::write(&self.engine_config_path, yaml_string).with_context(|| {
            format!("Failed to write engine config: {}", self.engine_config_path)
        })?;

        tracing::info!("Saved engine config to {}", self.engine_config_path);
        Ok(())
    }
}
