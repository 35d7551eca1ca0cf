use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn builtin_locales_are_complete() -> Result<(), Box<dyn Error>> {
    Command::cargo_bin("quillpad-cli")?
        .arg("locales")
        .assert()
        .success()
        .stdout(predicate::str::contains("en\tEnglish"))
        .stdout(predicate::str::contains("hr\tHrvatski"))
        .stdout(predicate::str::contains("de\tDeutsch"))
        .stdout(predicate::str::contains("  - ").not());
    Ok(())
}

#[test]
fn directory_catalog_lists_missing_keys() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("de.json"),
        r#"{ "locale": "de", "display_name": "Deutsch (Test)", "strings": { "app.name": "Quillpad" } }"#,
    )?;

    Command::cargo_bin("quillpad-cli")?
        .args(["locales", "--dir", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("de\tDeutsch (Test)"))
        .stdout(predicate::str::contains("  - menu.file.new"));
    Ok(())
}
