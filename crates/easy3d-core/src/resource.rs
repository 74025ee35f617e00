//! Location of shared resources (demo data, color map images).
//!
//! The directory is resolved once: an explicitly set directory wins, then the
//! `EASY3D_RESOURCES_DIR` environment variable, then the first `resources`
//! directory found walking up from the current directory.

use std::path::{Path, PathBuf};
use std::sync::{OnceLock, PoisonError, RwLock};

/// Environment variable overriding the resource directory.
pub const RESOURCES_ENV: &str = "EASY3D_RESOURCES_DIR";

static DIRECTORY: OnceLock<RwLock<Option<PathBuf>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<PathBuf>> {
    DIRECTORY.get_or_init(|| RwLock::new(None))
}

/// Sets the resource directory explicitly.
pub fn set_directory(dir: impl Into<PathBuf>) {
    let dir = dir.into();
    if !dir.is_dir() {
        log::warn!("resource directory does not exist: {}", dir.display());
    }
    *slot().write().unwrap_or_else(PoisonError::into_inner) = Some(dir);
}

/// Returns the resource directory.
pub fn directory() -> PathBuf {
    if let Some(dir) = slot()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
    {
        return dir;
    }
    let dir = locate();
    log::debug!("resource directory: {}", dir.display());
    *slot().write().unwrap_or_else(PoisonError::into_inner) = Some(dir.clone());
    dir
}

/// Absolute path of a file inside the resource directory.
pub fn file(relative: impl AsRef<Path>) -> PathBuf {
    directory().join(relative)
}

fn locate() -> PathBuf {
    if let Some(dir) = std::env::var_os(RESOURCES_ENV) {
        return PathBuf::from(dir);
    }
    if let Ok(cwd) = std::env::current_dir() {
        for ancestor in cwd.ancestors().take(4) {
            let candidate = ancestor.join("resources");
            if candidate.is_dir() {
                return candidate;
            }
        }
    }
    PathBuf::from("resources")
}
