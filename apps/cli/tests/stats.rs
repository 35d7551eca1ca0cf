use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

#[test]
fn stats_json_reports_counts() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("notes.txt");
    fs::write(&input, "ab c\nčd\n")?;

    let output = Command::cargo_bin("quillpad-cli")?
        .args(["stats", input.to_str().unwrap(), "--json"])
        .output()?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["characters"], 8);
    assert_eq!(value["non_blank_characters"], 5);
    assert_eq!(value["lines"], 3);
    Ok(())
}

#[test]
fn stats_text_is_pluralized_per_language() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("notes.txt");
    fs::write(&input, "x")?;

    Command::cargo_bin("quillpad-cli")?
        .args(["stats", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("It spans 1 line."));

    fs::write(&input, "a\nb\nc")?;
    Command::cargo_bin("quillpad-cli")?
        .args(["stats", input.to_str().unwrap(), "--language", "hr"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Proteže se kroz 3 retka."));
    Ok(())
}

#[test]
fn stats_rejects_unknown_language() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("notes.txt");
    fs::write(&input, "x")?;

    Command::cargo_bin("quillpad-cli")?
        .args(["stats", input.to_str().unwrap(), "--language", "xx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown language 'xx'"));
    Ok(())
}
