use crate::error::{SyncError, SyncResult};
use camino::{Utf8Path, Utf8PathBuf};

/// Directories managed under the weave root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryKind {
    Root,
    Mods,
    Agents,
    Profiles,
    Logs,
    HistoryLogs,
    ClientLogs,
}

impl DirectoryKind {
    pub fn all() -> &'static [DirectoryKind] {
        &[
            DirectoryKind::Root,
            DirectoryKind::Mods,
            DirectoryKind::Agents,
            DirectoryKind::Profiles,
            DirectoryKind::Logs,
            DirectoryKind::HistoryLogs,
            DirectoryKind::ClientLogs,
        ]
    }

    fn relative(&self) -> &'static str {
        match self {
            DirectoryKind::Root => "",
            DirectoryKind::Mods => "mods",
            DirectoryKind::Agents => "agents",
            DirectoryKind::Profiles => "profiles",
            DirectoryKind::Logs => "logs",
            DirectoryKind::HistoryLogs => "logs/history",
            DirectoryKind::ClientLogs => "logs/client",
        }
    }
}

/// Resolves every path the manager touches from a single root.
///
/// Layout (relative to root):
/// - `mods/`, `agents/`: `*.jar` with an optional `.disabled` suffix
/// - `profiles/`: `<name>.mprof`, `<name>.lprof`
/// - `logs/history/history.log`: process history
/// - `manager.settings`, `analytics.json`, `loader.jar`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: Utf8PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<home>/.weave`
    pub fn from_home() -> SyncResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| SyncError::NotFound("home directory".to_string()))?;
        let home = Utf8PathBuf::from_path_buf(home).map_err(|p| {
            SyncError::Validation(format!("home directory is not UTF-8: {}", p.display()))
        })?;
        Ok(Self::new(home.join(".weave")))
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of a directory kind without touching the filesystem.
    pub fn path_of(&self, kind: DirectoryKind) -> Utf8PathBuf {
        match kind {
            DirectoryKind::Root => self.root.clone(),
            other => self.root.join(other.relative()),
        }
    }

    /// Path of a directory kind, creating it (and its parents) if absent.
    pub async fn resolve(&self, kind: DirectoryKind) -> SyncResult<Utf8PathBuf> {
        let dir = self.path_of(kind);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| SyncError::io(&dir, e))?;
        Ok(dir)
    }

    /// Create the whole directory tree.
    pub async fn ensure_all(&self) -> SyncResult<()> {
        for kind in DirectoryKind::all() {
            self.resolve(*kind).await?;
        }
        Ok(())
    }

    pub fn settings_file(&self) -> Utf8PathBuf {
        self.root.join("manager.settings")
    }

    pub fn analytics_file(&self) -> Utf8PathBuf {
        self.root.join("analytics.json")
    }

    pub fn loader_file(&self) -> Utf8PathBuf {
        self.root.join("loader.jar")
    }

    /// Write-ahead marker for an in-flight loader install.
    pub fn pending_install_file(&self) -> Utf8PathBuf {
        self.root.join("loader.pending")
    }

    pub fn history_file(&self) -> Utf8PathBuf {
        self.path_of(DirectoryKind::HistoryLogs).join("history.log")
    }

    pub fn engine_config_file(&self) -> Utf8PathBuf {
        self.root.join("manager.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_layout() -> (Layout, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().join(".weave")).unwrap();
        (Layout::new(root), temp_dir)
    }

    #[tokio::test]
    async fn test_resolve_creates_directory() {
        let (layout, _temp_dir) = create_test_layout();

        let history = layout.resolve(DirectoryKind::HistoryLogs).await.unwrap();

        assert!(history.is_dir());
        assert!(history.ends_with("logs/history"));
        assert!(layout.root().is_dir());
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let (layout, _temp_dir) = create_test_layout();

        let first = layout.resolve(DirectoryKind::Mods).await.unwrap();
        let second = layout.resolve(DirectoryKind::Mods).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_ensure_all() {
        let (layout, _temp_dir) = create_test_layout();
        layout.ensure_all().await.unwrap();

        for kind in DirectoryKind::all() {
            assert!(layout.path_of(*kind).is_dir(), "{:?} missing", kind);
        }
    }

    #[tokio::test]
    async fn test_resolve_propagates_io_error() {
        let (layout, _temp_dir) = create_test_layout();
        // A regular file where the root directory should be
        std::fs::write(layout.root(), b"not a directory").unwrap();

        let result = layout.resolve(DirectoryKind::Profiles).await;
        assert!(matches!(result, Err(SyncError::Io { .. })));
    }

    #[test]
    fn test_fixed_files() {
        let layout = Layout::new("/home/user/.weave");
        assert_eq!(layout.settings_file(), "/home/user/.weave/manager.settings");
        assert_eq!(layout.loader_file(), "/home/user/.weave/loader.jar");
        assert_eq!(
            layout.history_file(),
            "/home/user/.weave/logs/history/history.log"
        );
    }
}
