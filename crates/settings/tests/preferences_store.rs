use quillpad_settings::{Preferences, PreferencesStore};
use std::fs;
use tempfile::tempdir;

#[test]
fn load_missing_file_returns_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");

    let store = PreferencesStore::load(&path).expect("load defaults");
    assert_eq!(store.preferences().ui.language, "en");
    assert_eq!(store.preferences().ui.window_width, 900);
    assert_eq!(store.preferences().ui.window_height, 600);
    assert_eq!(store.preferences().editor.font_size, 14.0);
    assert!(store.preferences().editor.confirm_on_exit);
    assert!(!path.exists());
}

#[test]
fn save_and_reload_roundtrip() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("nested").join("preferences.json");

    let mut store = PreferencesStore::new(path.clone(), Preferences::default());
    store
        .update(|prefs| {
            prefs.ui.language = "hr".to_string();
            prefs.editor.font_size = 18.0;
        })
        .expect("save");

    let reloaded = PreferencesStore::load(&path).expect("reload");
    assert_eq!(reloaded.preferences().ui.language, "hr");
    assert_eq!(reloaded.preferences().editor.font_size, 18.0);
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn overwrite_sanitizes_values() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");

    let mut store = PreferencesStore::load(&path).expect("default");
    let mut prefs = store.preferences().clone();
    prefs.ui.language = "  ".to_string();
    prefs.ui.window_width = 10;
    prefs.editor.font_size = -3.0;

    store.overwrite(prefs).expect("overwrite");

    let current = store.preferences();
    assert_eq!(current.ui.language, "en");
    assert_eq!(current.ui.window_width, 320);
    assert_eq!(current.editor.font_size, 14.0);
}

#[test]
fn legacy_version_is_upgraded_on_load() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");
    fs::write(
        &path,
        r#"{
            "version": 0,
            "ui": {
                "language": " de ",
                "window_height": 100000
            }
        }"#,
    )
    .expect("write legacy prefs");

    let store = PreferencesStore::load(&path).expect("load legacy file");
    let prefs = store.preferences();
    assert_eq!(
        prefs.version, 1,
        "legacy preferences should be upgraded to schema version 1"
    );
    assert_eq!(prefs.ui.language, "de", "language should be trimmed");
    assert_eq!(prefs.ui.window_width, 900, "missing fields use defaults");
    assert_eq!(prefs.ui.window_height, 16_384, "oversized window is clamped");
    assert!(prefs.editor.confirm_on_exit);
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");
    fs::write(&path, "{ not json").expect("write corrupt prefs");

    assert!(PreferencesStore::load(&path).is_err());
    let store = PreferencesStore::load_or_default(&path);
    assert_eq!(store.preferences(), &Preferences::default());
    assert_eq!(store.path(), path.as_path());
}
