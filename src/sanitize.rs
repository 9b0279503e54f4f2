//! Display name → file stem mapping for persisted profiles.
//!
//! Two display names that differ only in punctuation or case map to the same
//! stem (`"My Pack!"` and `"my pack?"` both become `my_pack_`). Creating the
//! second one fails with [`SyncError::AlreadyExists`](crate::SyncError); the
//! original display name is kept inside the file.

use regex::Regex;
use std::sync::LazyLock;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]").expect("Invalid sanitize regex"));

/// Replace every character outside `[A-Za-z0-9]` with `_`, then lowercase.
pub fn sanitize_file_name(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "_").to_lowercase()
}
