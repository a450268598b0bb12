use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("mobile-guru").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: mobile-guru <COMMAND>"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("catalog"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_start_help() {
    let mut cmd = Command::cargo_bin("mobile-guru").unwrap();
    cmd.arg("start")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: mobile-guru start"))
        .stdout(predicate::str::contains("--port <PORT>"))
        .stdout(predicate::str::contains("--catalog <CATALOG>"))
        .stdout(predicate::str::contains("--timeout-secs <TIMEOUT_SECS>"));
}

#[test]
fn test_cli_chat_help() {
    let mut cmd = Command::cargo_bin("mobile-guru").unwrap();
    cmd.arg("chat")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--server <SERVER>"))
        .stdout(predicate::str::contains("--direct"));
}

#[test]
fn test_cli_no_command() {
    let mut cmd = Command::cargo_bin("mobile-guru").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage: mobile-guru <COMMAND>"));
}

#[test]
fn test_catalog_lists_builtin_phones() {
    let mut cmd = Command::cargo_bin("mobile-guru").unwrap();
    cmd.arg("catalog")
        .env_remove("GURU_CATALOG")
        .assert()
        .success()
        .stdout(predicate::str::contains("iPhone 15 (Apple) - ₹69900"));
}

#[test]
fn test_catalog_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"[{{"name":"Nothing Phone 2a","brand":"Nothing","price":23999}}]"#).unwrap();

    let mut cmd = Command::cargo_bin("mobile-guru").unwrap();
    cmd.arg("catalog")
        .arg("--catalog")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing Phone 2a (Nothing) - ₹23999"))
        .stdout(predicate::str::contains("iPhone").not());
}

#[test]
fn test_catalog_rejects_bad_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();

    let mut cmd = Command::cargo_bin("mobile-guru").unwrap();
    cmd.arg("catalog")
        .arg("--catalog")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load catalog"));
}
