use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Errors produced by the synchronization core.
///
/// Validation and existence failures are reported to the caller as values;
/// I/O, parse and network failures carry enough context to be logged and
/// retried.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── Validation ──────────────────────────────────────
    #[error("Invalid input: {0}")]
    Validation(String),

    // ── Existence ───────────────────────────────────────
    #[error("Already exists: {path}")]
    AlreadyExists { path: Utf8PathBuf },

    #[error("Not found: {0}")]
    NotFound(String),

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    // ── Persisted data ──────────────────────────────────
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to read mod manifest {path}: {message}")]
    Manifest { path: Utf8PathBuf, message: String },

    // ── Network ─────────────────────────────────────────
    #[error("Request to {url} failed: {message}")]
    Network {
        url: String,
        message: String,
        retryable: bool,
    },

    // ── Integrity ───────────────────────────────────────
    #[error("Integrity check failed: {0}")]
    Integrity(String),
}

/// Convenience alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Wrap an I/O error with the path it happened on.
    ///
    /// `ErrorKind::NotFound` becomes [`SyncError::NotFound`] so callers can
    /// tell a missing file from a failing disk.
    pub fn io(path: impl AsRef<Utf8Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == std::io::ErrorKind::NotFound {
            return SyncError::NotFound(path.to_string());
        }
        SyncError::Io { path, source }
    }

    pub fn parse(path: impl AsRef<Utf8Path>, source: serde_json::Error) -> Self {
        SyncError::Parse {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn network(url: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        SyncError::Network {
            url: url.into(),
            message: message.into(),
            retryable,
        }
    }

    /// Whether repeating the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network { retryable, .. } => *retryable,
            SyncError::Io { .. } => true,
            _ => false,
        }
    }
}
