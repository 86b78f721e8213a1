//! Settings file in the platform config directory.

use anyhow::{Context, Result};
use shared::settings::AppSettings;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "Oracle", "Oracle")
        .map(|proj| proj.config_dir().join("settings.json"))
}

/// Load settings, falling back to defaults when the file is missing or unreadable.
pub fn load_settings_or_default(path: Option<&Path>) -> AppSettings {
    let Some(path) = path else {
        return AppSettings::default();
    };
    if !path.exists() {
        return AppSettings::default();
    }
    match fs::read(path).map(|bytes| serde_json::from_slice::<AppSettings>(&bytes)) {
        Ok(Ok(settings)) => settings,
        Ok(Err(e)) => {
            warn!(path = %path.display(), error = %e, "settings file is malformed, using defaults");
            AppSettings::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read settings, using defaults");
            AppSettings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let bytes = serde_json::to_vec_pretty(settings)?;
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
