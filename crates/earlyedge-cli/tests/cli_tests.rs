//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn earlyedge() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("earlyedge").unwrap()
}

#[test]
fn validate_letter_confusion_bank() {
    earlyedge()
        .arg("validate")
        .arg("--bank")
        .arg("../../banks/letter_confusion.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("7 items"))
        .stdout(predicate::str::contains("All question banks valid"));
}

#[test]
fn validate_tracing_bank() {
    earlyedge()
        .arg("validate")
        .arg("--bank")
        .arg("../../banks/letter_tracing.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("52 items"));
}

#[test]
fn validate_bank_directory() {
    earlyedge()
        .arg("validate")
        .arg("--bank")
        .arg("../../banks")
        .assert()
        .success()
        .stdout(predicate::str::contains("letter-confusion-v1"))
        .stdout(predicate::str::contains("phonospeech-v1"));
}

#[test]
fn validate_flags_broken_bank() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[bank]
id = "broken"
name = "Broken"
test = "letter-confusion"

[[items]]
prompt = "Pick one"
options = ["b", "d"]
answer = "q"
"#,
    )
    .unwrap();

    earlyedge()
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("not among the options"))
        .stdout(predicate::str::contains("warning"));
}

#[test]
fn validate_missing_file_fails() {
    earlyedge()
        .arg("validate")
        .arg("--bank")
        .arg("/definitely/not/here.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn list_tests_shows_all_seven() {
    earlyedge()
        .arg("list-tests")
        .assert()
        .success()
        .stdout(predicate::str::contains("arithmetic"))
        .stdout(predicate::str::contains("number-comparison"))
        .stdout(predicate::str::contains("letter-confusion"))
        .stdout(predicate::str::contains("letter-tracing"))
        .stdout(predicate::str::contains("spelling"))
        .stdout(predicate::str::contains("phono-speech"))
        .stdout(predicate::str::contains("handwriting"));
}

#[test]
fn init_scaffolds_config_and_bank() {
    let dir = TempDir::new().unwrap();

    earlyedge()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created earlyedge.toml"));

    assert!(dir.path().join("earlyedge.toml").exists());
    assert!(dir.path().join("banks/letter_confusion.toml").exists());

    // Re-running never clobbers existing files.
    earlyedge()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn run_rejects_unknown_test() {
    earlyedge()
        .arg("run")
        .arg("--test")
        .arg("algebra")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown test"));
}

#[test]
fn run_requires_a_bank_for_letter_confusion() {
    let dir = TempDir::new().unwrap();
    earlyedge()
        .current_dir(dir.path())
        .arg("run")
        .arg("--test")
        .arg("letter-confusion")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--bank is required"));
}
