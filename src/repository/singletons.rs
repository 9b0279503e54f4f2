use super::{Repository, exists, write_json};
use crate::error::{SyncError, SyncResult};
use crate::models::{Analytics, MinecraftProcess, ProcessHistory, Settings};
use crate::paths::DirectoryKind;
use camino::Utf8Path;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Write-ahead record of a loader install that has not been confirmed in
/// settings yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInstall {
    pub version: String,
    /// Uppercase hex SHA-256 of the artifact being installed.
    pub checksum: String,
}

impl Repository {
    /// Current settings; a missing file is created with defaults.
    pub async fn read_settings(&self) -> SyncResult<Settings> {
        let path = self.layout.settings_file();
        self.layout.resolve(DirectoryKind::Root).await?;
        let _guard = self.lock(&path).await;
        load_or_init(&path).await
    }

    pub async fn write_settings(&self, settings: &Settings) -> SyncResult<()> {
        let path = self.layout.settings_file();
        self.layout.resolve(DirectoryKind::Root).await?;
        let _guard = self.lock(&path).await;
        write_json(&path, settings).await?;
        tracing::info!("Saved settings to {}", path);
        Ok(())
    }

    /// Read-modify-write of the settings file under its lock.
    pub async fn update_settings<F>(&self, apply: F) -> SyncResult<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let path = self.layout.settings_file();
        self.layout.resolve(DirectoryKind::Root).await?;
        let _guard = self.lock(&path).await;

        let mut settings: Settings = load_or_init(&path).await?;
        apply(&mut settings);
        write_json(&path, &settings).await?;

        tracing::info!("Updated settings in {}", path);
        Ok(settings)
    }

    /// Like [`update_settings`](Self::update_settings), but an unparsable
    /// file is set aside as `manager.settings.corrupt` and `fallback` is
    /// used as the starting point instead.
    pub async fn update_settings_over<F>(&self, fallback: &Settings, apply: F) -> SyncResult<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let path = self.layout.settings_file();
        self.layout.resolve(DirectoryKind::Root).await?;
        let _guard = self.lock(&path).await;

        let mut settings: Settings = match load_or_init(&path).await {
            Ok(settings) => settings,
            Err(e @ SyncError::Parse { .. }) => {
                let aside = path.with_extension("settings.corrupt");
                tracing::warn!("Replacing unreadable settings, old file kept at {}: {}", aside, e);
                tokio::fs::rename(&path, &aside)
                    .await
                    .map_err(|e| SyncError::io(&aside, e))?;
                fallback.clone()
            }
            Err(e) => return Err(e),
        };
        apply(&mut settings);
        write_json(&path, &settings).await?;

        tracing::info!("Updated settings in {}", path);
        Ok(settings)
    }

    /// Persisted process history; a missing file is created empty.
    pub async fn read_process_history(&self) -> SyncResult<ProcessHistory> {
        let path = self.layout.history_file();
        self.layout.resolve(DirectoryKind::HistoryLogs).await?;
        let _guard = self.lock(&path).await;
        load_or_init(&path).await
    }

    /// Append processes not already logged, rewriting the whole file.
    ///
    /// Returns the resulting history and how many entries were added. When
    /// nothing is new the file is left untouched.
    pub async fn append_process_history(
        &self,
        processes: Vec<MinecraftProcess>,
    ) -> SyncResult<(ProcessHistory, usize)> {
        let path = self.layout.history_file();
        self.layout.resolve(DirectoryKind::HistoryLogs).await?;
        let _guard = self.lock(&path).await;

        let mut history: ProcessHistory = load_or_init(&path).await?;
        let added = history.extend_unique(processes);
        if added > 0 {
            write_json(&path, &history).await?;
            tracing::info!("Appended {} process(es) to {}", added, path);
        }
        Ok((history, added))
    }

    /// Write empty analytics unless the file already exists.
    ///
    /// Returns whether the file was written.
    pub async fn write_analytics_once(&self) -> SyncResult<bool> {
        let path = self.layout.analytics_file();
        self.layout.resolve(DirectoryKind::Root).await?;
        let _guard = self.lock(&path).await;

        if exists(&path).await? {
            tracing::debug!("Analytics already present at {}", path);
            return Ok(false);
        }
        write_json(&path, &Analytics::default()).await?;
        tracing::info!("Wrote analytics to {}", path);
        Ok(true)
    }

    /// Analytics, or `NotFound` before the first install.
    pub async fn read_analytics(&self) -> SyncResult<Analytics> {
        let path = self.layout.analytics_file();
        read_json(&path).await
    }

    pub async fn write_pending_install(&self, pending: &PendingInstall) -> SyncResult<()> {
        let path = self.layout.pending_install_file();
        self.layout.resolve(DirectoryKind::Root).await?;
        let _guard = self.lock(&path).await;
        write_json(&path, pending).await
    }

    pub async fn read_pending_install(&self) -> SyncResult<Option<PendingInstall>> {
        let path = self.layout.pending_install_file();
        let _guard = self.lock(&path).await;
        match read_json(&path).await {
            Ok(pending) => Ok(Some(pending)),
            Err(SyncError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove the marker. Absent is fine.
    pub async fn clear_pending_install(&self) -> SyncResult<()> {
        let path = self.layout.pending_install_file();
        let _guard = self.lock(&path).await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::io(&path, e)),
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> SyncResult<T> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SyncError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| SyncError::parse(path, e))
}

/// Read `path`, or write and return the default if it does not exist.
///
/// Caller must hold the path lock.
async fn load_or_init<T>(path: &Utf8Path) -> SyncResult<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    match read_json(path).await {
        Ok(value) => Ok(value),
        Err(SyncError::NotFound(_)) => {
            let value = T::default();
            write_json(path, &value).await?;
            tracing::info!("Initialized {} with defaults", path);
            Ok(value)
        }
        Err(e) => Err(e),
    }
}
