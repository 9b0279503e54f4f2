//! SHA-256 checks for the installed loader artifact.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

/// Compares the installed artifact against an expected checksum.
#[async_trait]
pub trait IntegrityChecker: Send + Sync {
    /// `Ok(false)` when the artifact is absent or differs.
    async fn matches(&self, expected: &str) -> SyncResult<bool>;
}

/// Hashes a file on disk.
#[derive(Debug, Clone)]
pub struct Sha256Integrity {
    loader_path: Utf8PathBuf,
}

impl Sha256Integrity {
    pub fn new(loader_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            loader_path: loader_path.into(),
        }
    }
}

#[async_trait]
impl IntegrityChecker for Sha256Integrity {
    async fn matches(&self, expected: &str) -> SyncResult<bool> {
        match sha256_file(&self.loader_path).await {
            Ok(actual) => Ok(checksums_equal(&actual, expected)),
            Err(SyncError::NotFound(_)) => {
                tracing::debug!("No artifact at {}", self.loader_path);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// Uppercase hex SHA-256 of `bytes`.
pub fn sha256_bytes(bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(bytes))
}

/// Uppercase hex SHA-256 of a file, streamed in chunks.
pub async fn sha256_file(path: &Utf8Path) -> SyncResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| SyncError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode_upper(hasher.finalize()))
}

pub fn checksums_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
