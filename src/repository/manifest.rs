use crate::error::{SyncError, SyncResult};
use crate::models::ModInfo;
use camino::Utf8Path;
use std::fs::File;
use zip::ZipArchive;
use zip::result::ZipError;

/// Manifest entry inside a weave mod jar.
pub const MANIFEST_ENTRY: &str = "weave.mod.json";

/// Reads [`ModInfo`] for a mod jar.
///
/// Called from a blocking task during mod scans; implementations may do
/// synchronous I/O.
pub trait ManifestReader: Send + Sync {
    fn read_manifest(&self, jar: &Utf8Path) -> SyncResult<ModInfo>;
}

/// Reads `weave.mod.json` from the jar's zip archive.
///
/// A jar without the entry, or with an entry that is not valid JSON, gets
/// [`ModInfo::default()`]. A file that is not a readable zip is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct JarManifestReader;

impl ManifestReader for JarManifestReader {
    fn read_manifest(&self, jar: &Utf8Path) -> SyncResult<ModInfo> {
        let file = File::open(jar).map_err(|e| SyncError::io(jar, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| manifest_error(jar, e))?;

        let entry = match archive.by_name(MANIFEST_ENTRY) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                tracing::debug!("No {} in {}", MANIFEST_ENTRY, jar);
                return Ok(ModInfo::default());
            }
            Err(e) => return Err(manifest_error(jar, e)),
        };

        match serde_json::from_reader(entry) {
            Ok(info) => Ok(info),
            Err(e) => {
                tracing::debug!("Malformed {} in {}: {}", MANIFEST_ENTRY, jar, e);
                Ok(ModInfo::default())
            }
        }
    }
}

fn manifest_error(jar: &Utf8Path, e: ZipError) -> SyncError {
    SyncError::Manifest {
        path: jar.to_path_buf(),
        message: e.to_string(),
    }
}
