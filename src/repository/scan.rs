use super::{Repository, ScanIssue, ScanReport};
use crate::error::{SyncError, SyncResult};
use crate::models::mods::split_disabled;
use crate::models::{Agent, JAR_MARKER, Mod, ModInfo};
use crate::paths::DirectoryKind;
use camino::Utf8PathBuf;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

/// A jar-like directory entry with the disabled suffix split off.
#[derive(Debug, Clone)]
struct JarEntry {
    disk_path: Utf8PathBuf,
    file_path: Utf8PathBuf,
    file_name: String,
    disabled: bool,
}

impl Repository {
    /// Scan `mods/` and read each jar's manifest.
    ///
    /// Manifests are read on blocking tasks, at most `manifest_concurrency`
    /// at a time. A jar whose manifest cannot be read is still listed (it
    /// can be toggled) with default [`ModInfo`], and the failure is reported.
    pub async fn read_mods(&self) -> SyncResult<ScanReport<Vec<Mod>>> {
        let (entries, mut issues) = self.scan_jars(DirectoryKind::Mods).await?;

        let results: Vec<(JarEntry, SyncResult<ModInfo>)> = stream::iter(entries)
            .map(|entry| {
                let reader = Arc::clone(&self.manifests);
                async move {
                    let path = entry.disk_path.clone();
                    let info = match tokio::task::spawn_blocking(move || reader.read_manifest(&path)).await {
                        Ok(result) => result,
                        Err(e) => Err(SyncError::Manifest {
                            path: entry.disk_path.clone(),
                            message: e.to_string(),
                        }),
                    };
                    (entry, info)
                }
            })
            .buffer_unordered(self.manifest_concurrency)
            .collect()
            .await;

        let mut mods = Vec::with_capacity(results.len());
        for (entry, info) in results {
            let mod_info = info.unwrap_or_else(|error| {
                tracing::warn!("Manifest unavailable for {}: {}", entry.disk_path, error);
                issues.push(ScanIssue {
                    path: entry.disk_path.clone(),
                    error,
                });
                ModInfo::default()
            });
            mods.push(Mod {
                mod_info,
                file_path: entry.file_path,
                file_name: entry.file_name,
                disabled: entry.disabled,
            });
        }
        mods.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        tracing::debug!("Scanned {} mod(s), {} issue(s)", mods.len(), issues.len());
        Ok(ScanReport {
            items: mods,
            issues,
        })
    }

    /// Scan `agents/`. Same rules as mods, without manifests.
    pub async fn read_agents(&self) -> SyncResult<ScanReport<Vec<Agent>>> {
        let (entries, issues) = self.scan_jars(DirectoryKind::Agents).await?;

        let mut agents: Vec<Agent> = entries
            .into_iter()
            .map(|entry| Agent {
                file_path: entry.file_path,
                file_name: entry.file_name,
                disabled: entry.disabled,
            })
            .collect();
        agents.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        tracing::debug!("Scanned {} agent(s), {} issue(s)", agents.len(), issues.len());
        Ok(ScanReport {
            items: agents,
            issues,
        })
    }

    /// Entries whose name contains `.jar` and that are not directories.
    async fn scan_jars(&self, kind: DirectoryKind) -> SyncResult<(Vec<JarEntry>, Vec<ScanIssue>)> {
        let dir = self.layout.resolve(kind).await?;
        let mut jars = Vec::new();
        let mut issues = Vec::new();

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

            let raw_name = entry.file_name();
            let Some(name) = raw_name.to_str() else {
                tracing::warn!("Skipping non UTF-8 entry in {}: {:?}", dir, raw_name);
                continue;
            };
            if !name.contains(JAR_MARKER) {
                continue;
            }

            match entry.file_type().await {
                Ok(file_type) if file_type.is_dir() => continue,
                Ok(_) => {}
                Err(e) => {
                    let path = dir.join(name);
                    issues.push(ScanIssue {
                        error: SyncError::io(&path, e),
                        path,
                    });
                    continue;
                }
            }

            let (file_name, disabled) = split_disabled(name);
            jars.push(JarEntry {
                disk_path: dir.join(name),
                file_path: dir.join(file_name),
                file_name: file_name.to_string(),
                disabled,
            });
        }

        Ok((jars, issues))
    }
}
