// Cache path utilities.
// Locates the data and credential backing files inside a cache directory.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// File name of the API response cache.
pub const DATA_CACHE_FILE: &str = "cache_contents.json";
/// File name of the OAuth credential cache.
pub const CREDS_CACHE_FILE: &str = "creds.json";

/// Get the base cache directory (~/.cache/postcache on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "postcache").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to the data cache inside `dir`.
pub fn data_cache_path(dir: &Path) -> PathBuf {
    dir.join(DATA_CACHE_FILE)
}

/// Path to the credential cache inside `dir`.
pub fn creds_cache_path(dir: &Path) -> PathBuf {
    dir.join(CREDS_CACHE_FILE)
}
