use super::{Repository, ScanIssue, ScanReport, exists, write_atomic, write_json};
use crate::error::{SyncError, SyncResult};
use crate::models::{LaunchProfile, ModProfile, Profile};
use crate::paths::DirectoryKind;
use crate::sanitize::sanitize_file_name;
use camino::Utf8PathBuf;
use indexmap::IndexMap;

impl Repository {
    /// Sanitized key and file path for a profile name.
    pub fn profile_location<P: Profile>(&self, name: &str) -> SyncResult<(String, Utf8PathBuf)> {
        if name.is_empty() {
            return Err(SyncError::Validation(format!("{} name is empty", P::KIND)));
        }
        let key = sanitize_file_name(name);
        let path = self
            .layout
            .path_of(DirectoryKind::Profiles)
            .join(format!("{}{}", key, P::EXTENSION));
        Ok((key, path))
    }

    /// Write a new profile. Fails with `AlreadyExists` and writes nothing if
    /// a profile with the same sanitized name is already on disk.
    pub async fn create_profile<P: Profile>(&self, profile: &P) -> SyncResult<String> {
        let (key, path) = self.profile_location::<P>(profile.name())?;
        self.layout.resolve(DirectoryKind::Profiles).await?;

        let _guard = self.lock(&path).await;
        if exists(&path).await? {
            tracing::info!("Refusing to create {} '{}': {} exists", P::KIND, profile.name(), path);
            return Err(SyncError::AlreadyExists { path });
        }

        write_json(&path, profile).await?;
        tracing::info!("Created {} '{}' at {}", P::KIND, profile.name(), path);
        Ok(key)
    }

    /// Overwrite (or create) a profile file.
    ///
    /// Launch profiles should go through [`save_launch_profile`](Self::save_launch_profile)
    /// so their embedded mod profile is written as well.
    pub async fn save_profile<P: Profile>(&self, profile: &P) -> SyncResult<String> {
        let (key, path) = self.profile_location::<P>(profile.name())?;
        self.layout.resolve(DirectoryKind::Profiles).await?;

        let _guard = self.lock(&path).await;
        write_json(&path, profile).await?;
        tracing::info!("Saved {} '{}'", P::KIND, profile.name());
        Ok(key)
    }

    /// Save a launch profile together with its embedded mod profile.
    ///
    /// The mod profile is written first. If that fails nothing else is
    /// written; if the launch profile write then fails, the mod profile file
    /// is restored to what it was before.
    pub async fn save_launch_profile(&self, profile: &LaunchProfile) -> SyncResult<String> {
        let Some(mod_profile) = &profile.mod_profile else {
            return self.save_profile(profile).await;
        };

        let (key, path) = self.profile_location::<LaunchProfile>(&profile.name)?;
        let (_, mod_path) = self.profile_location::<ModProfile>(&mod_profile.name)?;
        self.layout.resolve(DirectoryKind::Profiles).await?;

        // Always mod profile first, then launch profile
        let _mod_guard = self.lock(&mod_path).await;
        let _guard = self.lock(&path).await;

        let previous = match tokio::fs::read(&mod_path).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(SyncError::io(&mod_path, e)),
        };

        write_json(&mod_path, mod_profile).await?;

        if let Err(err) = write_json(&path, profile).await {
            tracing::error!(
                "Saving launch profile '{}' failed, restoring {}: {}",
                profile.name,
                mod_path,
                err
            );
            let restored = match previous {
                Some(bytes) => write_atomic(&mod_path, &bytes).await,
                None => tokio::fs::remove_file(&mod_path)
                    .await
                    .map_err(|e| SyncError::io(&mod_path, e)),
            };
            if let Err(restore_err) = restored {
                tracing::error!("Could not restore {}: {}", mod_path, restore_err);
            }
            return Err(err);
        }

        tracing::info!(
            "Saved launch profile '{}' with mod profile '{}'",
            profile.name,
            mod_profile.name
        );
        Ok(key)
    }

    /// Remove a profile file. A missing file is `NotFound`.
    pub async fn delete_profile<P: Profile>(&self, profile: &P) -> SyncResult<String> {
        let (key, path) = self.profile_location::<P>(profile.name())?;

        let _guard = self.lock(&path).await;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| SyncError::io(&path, e))?;

        tracing::info!("Deleted {} '{}'", P::KIND, profile.name());
        Ok(key)
    }

    /// Read every profile of kind `P`, keyed by file stem, sorted by key.
    ///
    /// Files that cannot be read or parsed are reported and skipped.
    pub async fn read_profiles<P: Profile>(&self) -> SyncResult<ScanReport<IndexMap<String, P>>> {
        let dir = self.layout.resolve(DirectoryKind::Profiles).await?;
        let mut issues = Vec::new();
        let mut files = Vec::new();

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| SyncError::io(&dir, e))?;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    issues.push(ScanIssue {
                        path: dir.clone(),
                        error: SyncError::io(&dir, e),
                    });
                    break;
                }
            };

            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let Some(key) = name.strip_suffix(P::EXTENSION) else {
                continue;
            };
            if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                continue;
            }
            files.push((key.to_string(), dir.join(&name)));
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut profiles = IndexMap::with_capacity(files.len());
        for (key, path) in files {
            match read_profile::<P>(&path).await {
                Ok(profile) => {
                    profiles.insert(key, profile);
                }
                Err(error) => {
                    tracing::warn!("Skipping {} {}: {}", P::KIND, path, error);
                    issues.push(ScanIssue { path, error });
                }
            }
        }

        tracing::debug!(
            "Read {} {}(s) from {} ({} issue(s))",
            profiles.len(),
            P::KIND,
            dir,
            issues.len()
        );
        Ok(ScanReport {
            items: profiles,
            issues,
        })
    }
}

async fn read_profile<P: Profile>(path: &Utf8PathBuf) -> SyncResult<P> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SyncError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| SyncError::parse(path, e))
}
