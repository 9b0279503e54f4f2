use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Suffix appended to a mod or agent file to disable it.
pub const DISABLED_SUFFIX: &str = ".disabled";

/// Marker a directory entry must contain to be treated as a mod or agent.
pub const JAR_MARKER: &str = ".jar";

/// Metadata from a mod's embedded `weave.mod.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModInfo {
    #[serde(default = "undefined")]
    pub name: String,
    #[serde(default = "undefined")]
    pub version: String,
    #[serde(default = "undefined")]
    pub description: String,
    #[serde(default)]
    pub authors: Vec<String>,
}

impl Default for ModInfo {
    fn default() -> Self {
        Self {
            name: undefined(),
            version: undefined(),
            description: undefined(),
            authors: Vec::new(),
        }
    }
}

fn undefined() -> String {
    "undefined".to_string()
}

/// A mod jar in `mods/`.
///
/// `file_path` and `file_name` never carry the disabled suffix; `disabled`
/// records whether the file on disk currently has it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mod {
    pub mod_info: ModInfo,
    pub file_path: Utf8PathBuf,
    pub file_name: String,
    pub disabled: bool,
}

/// A java agent jar in `agents/`. Same suffix rules as [`Mod`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub file_path: Utf8PathBuf,
    pub file_name: String,
    pub disabled: bool,
}

/// Shared shape of entities whose enabled state is a filename suffix.
pub trait Toggleable: Clone {
    fn identity(&self) -> &str;
    fn file_path(&self) -> &Utf8Path;
    fn is_disabled(&self) -> bool;
    fn with_disabled(&self, disabled: bool) -> Self;

    /// Where the file currently lives on disk.
    fn disk_path(&self) -> Utf8PathBuf {
        if self.is_disabled() {
            disabled_path(self.file_path())
        } else {
            self.file_path().to_path_buf()
        }
    }
}

impl Toggleable for Mod {
    fn identity(&self) -> &str {
        &self.file_name
    }

    fn file_path(&self) -> &Utf8Path {
        &self.file_path
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn with_disabled(&self, disabled: bool) -> Self {
        Self {
            disabled,
            ..self.clone()
        }
    }
}

impl Toggleable for Agent {
    fn identity(&self) -> &str {
        &self.file_name
    }

    fn file_path(&self) -> &Utf8Path {
        &self.file_path
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn with_disabled(&self, disabled: bool) -> Self {
        Self {
            disabled,
            ..self.clone()
        }
    }
}

/// `path` with the disabled suffix appended.
pub fn disabled_path(path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{}{}", path, DISABLED_SUFFIX))
}

/// Split a directory entry name into its identity and disabled flag.
pub fn split_disabled(name: &str) -> (&str, bool) {
    match name.strip_suffix(DISABLED_SUFFIX) {
        Some(stem) => (stem, true),
        None => (name, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_disabled() {
        assert_eq!(split_disabled("A.jar"), ("A.jar", false));
        assert_eq!(split_disabled("B.jar.disabled"), ("B.jar", true));
    }

    #[test]
    fn test_disk_path() {
        let m = Mod {
            mod_info: ModInfo::default(),
            file_path: Utf8PathBuf::from("/w/mods/B.jar"),
            file_name: "B.jar".to_string(),
            disabled: true,
        };
        assert_eq!(m.disk_path(), Utf8PathBuf::from("/w/mods/B.jar.disabled"));
        assert_eq!(m.with_disabled(false).disk_path(), Utf8PathBuf::from("/w/mods/B.jar"));
    }

    #[test]
    fn test_mod_info_partial_manifest() {
        let info: ModInfo = serde_json::from_str(r#"{"name":"Zoom"}"#).unwrap();
        assert_eq!(info.name, "Zoom");
        assert_eq!(info.version, "undefined");
        assert!(info.authors.is_empty());
    }
}
