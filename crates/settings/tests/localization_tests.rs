use std::fs;

use quillpad_settings::{LocalizationError, LocalizationManager, LocalizationParams};
use tempfile::tempdir;

#[test]
fn fallback_returns_builtin_strings() {
    let manager = LocalizationManager::fallback();
    assert_eq!(manager.text("menu.file"), "File");
    assert_eq!(manager.text("missing.key"), "missing.key");
    assert_eq!(manager.active_code(), "en");
}

#[test]
fn indexed_placeholders_are_applied() {
    let manager = LocalizationManager::fallback();
    let values = ["notes.txt"];
    let params = LocalizationParams::new(&values);
    assert_eq!(
        manager
            .text_with_params("window.title", &params)
            .as_ref(),
        "notes.txt - Quillpad"
    );
}

#[test]
fn builtin_manager_ships_croatian_and_german() {
    let mut manager = LocalizationManager::builtin();
    let codes: Vec<String> = manager
        .locale_summaries()
        .into_iter()
        .map(|summary| summary.code)
        .collect();
    assert_eq!(codes, vec!["en", "hr", "de"]);

    assert!(manager.set_active_by_code("hr"));
    assert_eq!(manager.text("menu.file"), "Datoteka");
    assert!(manager.set_active_by_code("de"));
    assert_eq!(manager.text("menu.file"), "Datei");
    assert!(!manager.set_active_by_code("fr"));
    assert_eq!(manager.active_code(), "de");
}

#[test]
fn bundled_catalogs_cover_every_english_key() {
    let manager = LocalizationManager::builtin();
    assert_eq!(manager.missing_keys("hr"), Some(Vec::new()));
    assert_eq!(manager.missing_keys("de"), Some(Vec::new()));
    assert_eq!(manager.missing_keys("fr"), None);
}

#[test]
fn croatian_plurals_use_three_forms() {
    let mut manager = LocalizationManager::builtin();
    assert!(manager.set_active_by_code("hr"));

    let render = |count| {
        manager
            .text_with_params("stats.lines", &LocalizationParams::count_only(count))
            .into_owned()
    };
    assert_eq!(render(1), "Proteže se kroz 1 redak.");
    assert_eq!(render(3), "Proteže se kroz 3 retka.");
    assert_eq!(render(5), "Proteže se kroz 5 redaka.");
    assert_eq!(render(21), "Proteže se kroz 21 redak.");
}

#[test]
fn english_plurals_distinguish_one_and_other() {
    let manager = LocalizationManager::builtin();
    assert_eq!(
        manager.text_with_params("stats.characters", &LocalizationParams::count_only(1)),
        "The document has 1 character."
    );
    assert_eq!(
        manager.text_with_params("stats.characters", &LocalizationParams::count_only(0)),
        "The document has 0 characters."
    );
}

#[test]
fn missing_translation_falls_back_to_english() {
    let temp = tempdir().expect("tempdir");
    fs::write(
        temp.path().join("it.json"),
        r#"{ "locale": "it", "display_name": "Italiano", "strings": { "menu.file": "File (it)" } }"#,
    )
    .expect("write locale");

    let mut manager = LocalizationManager::load_from_dir(temp.path(), "en").expect("load");
    assert!(manager.set_active_by_code("it"));
    assert_eq!(manager.text("menu.file"), "File (it)");
    assert_eq!(manager.text("menu.edit"), "Edit");
    assert!(manager
        .missing_keys("it")
        .expect("catalog present")
        .contains(&"menu.edit".to_string()));
}

#[test]
fn directory_catalog_replaces_bundled_one() {
    let temp = tempdir().expect("tempdir");
    fs::write(
        temp.path().join("de.json"),
        r#"{ "locale": "de", "display_name": "Deutsch (angepasst)", "strings": { "menu.file": "Ablage" } }"#,
    )
    .expect("write locale");

    let mut manager = LocalizationManager::load_from_dir(temp.path(), "en").expect("load");
    assert_eq!(
        manager
            .locale_summaries()
            .iter()
            .filter(|summary| summary.code == "de")
            .count(),
        1
    );
    assert!(manager.set_active_by_code("de"));
    assert_eq!(manager.text("menu.file"), "Ablage");
}

#[test]
fn missing_directory_keeps_builtin_catalogs() {
    let temp = tempdir().expect("tempdir");
    let manager =
        LocalizationManager::load_from_dir(temp.path().join("absent"), "hr").expect("load");
    assert_eq!(manager.active_code(), "hr");
    assert_eq!(manager.catalog_stats().len(), 3);
}

#[test]
fn plural_requires_other_category() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("xx.json");
    fs::write(
        &path,
        r#"
        {
            "locale": "xx",
            "strings": {
                "sample": {
                    "type": "plural",
                    "one": "only one"
                }
            }
        }
        "#,
    )
    .expect("write locale");

    let error = LocalizationManager::load_from_dir(temp.path(), "en").unwrap_err();
    match error {
        LocalizationError::PluralMissingOther { locale, key } => {
            assert_eq!(locale, "xx");
            assert_eq!(key, "sample");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
