use std::path::PathBuf;

use directories::ProjectDirs;
use quillpad_settings::PreferencesStore;

const APP_QUALIFIER: &str = "org";
const APP_ORG: &str = "Quillpad";
const APP_NAME: &str = "Quillpad";
const PREFERENCES_FILENAME: &str = "preferences.json";

/// Location of the preferences file, `None` when no home directory is known.
pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(PREFERENCES_FILENAME))
}

pub fn load_preferences() -> Option<PreferencesStore> {
    let Some(path) = settings_path() else {
        tracing::warn!("could not determine preferences path, using defaults");
        return None;
    };
    tracing::debug!("preferences at {}", path.display());
    Some(PreferencesStore::load_or_default(path))
}
