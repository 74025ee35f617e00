//! Initialization of easy3d-rs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use easy3d_core::{resource, version, with_settings_mut, Result, Settings};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Options for [`initialize_with`].
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// JSON settings file to load. Missing fields keep their defaults.
    pub settings_file: Option<PathBuf>,
    /// Resource directory holding demo data and color maps.
    pub resource_dir: Option<PathBuf>,
}

/// Initializes easy3d-rs with default settings.
///
/// Sets up logging and locates the resource directory. Calling it more than
/// once is harmless.
///
/// # Example
///
/// ```no_run
/// fn main() -> easy3d::Result<()> {
///     easy3d::initialize()?;
///     let mut viewer = easy3d::Viewer::new("Tutorial", 800, 600);
///     // add models, then drive the viewer
///     Ok(())
/// }
/// ```
pub fn initialize() -> Result<()> {
    initialize_with(&InitOptions::default())
}

/// Initializes easy3d-rs with explicit options.
pub fn initialize_with(options: &InitOptions) -> Result<()> {
    let _ = env_logger::try_init();

    if let Some(dir) = &options.resource_dir {
        resource::set_directory(dir.clone());
    }
    if let Some(file) = &options.settings_file {
        let loaded = Settings::load(file)?;
        with_settings_mut(|s| *s = loaded);
        log::info!("settings loaded from {}", file.display());
    }

    if !INITIALIZED.swap(true, Ordering::SeqCst) {
        log::info!(
            "easy3d-rs {} initialized (resources: {})",
            version::version_string(),
            resource::directory().display()
        );
    }
    Ok(())
}

/// Returns whether [`initialize`] has been called.
#[must_use]
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::SeqCst)
}
