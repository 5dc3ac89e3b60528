//! Smoke tests to verify command wiring and exit codes

use assert_cmd::Command;
use predicates::prelude::*;

fn mosctl(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mosctl").unwrap();
    cmd.current_dir(dir.path()).env_remove("DATABASE_URL");
    cmd
}

// === Help Tests ===

#[test]
fn test_top_level_help_lists_commands() {
    let mut cmd = Command::cargo_bin("mosctl").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn test_migrate_help() {
    let mut cmd = Command::cargo_bin("mosctl").unwrap();
    cmd.arg("migrate").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Skip the confirmation prompt"));
}

#[test]
fn test_submit_help() {
    let mut cmd = Command::cargo_bin("mosctl").unwrap();
    cmd.arg("submit").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ratings"))
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn test_stats_help() {
    let mut cmd = Command::cargo_bin("mosctl").unwrap();
    cmd.arg("stats").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Output format"));
}

#[test]
fn test_completions_bash() {
    let mut cmd = Command::cargo_bin("mosctl").unwrap();
    cmd.arg("completions").arg("bash");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("mosctl"));
}

// === Input Validation Tests ===

#[test]
fn test_unknown_format_rejected() {
    let mut cmd = Command::cargo_bin("mosctl").unwrap();
    cmd.arg("participants").arg("--format").arg("yaml");

    cmd.assert().failure().code(2);
}

#[test]
fn test_submit_rejects_bad_email_before_touching_database() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ratings.json"), r#"{"ratings": []}"#).unwrap();

    mosctl(&dir)
        .args(["submit", "--name", "Asep", "--email", "not-an-email"])
        .args(["--ratings", "ratings.json"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("email"));
}

#[test]
fn test_submit_rejects_empty_ratings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ratings.json"), r#"{"ratings": []}"#).unwrap();

    mosctl(&dir)
        .args(["submit", "--name", "Asep", "--email", "asep@example.org"])
        .args(["--ratings", "ratings.json"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_submit_missing_file_is_general_failure() {
    let dir = tempfile::tempdir().unwrap();

    mosctl(&dir)
        .args(["submit", "--name", "Asep", "--email", "asep@example.org"])
        .args(["--ratings", "missing.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read ratings file"));
}

#[test]
fn test_submit_out_of_range_rating_is_user_correctable() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("ratings.json"),
        r#"{"ratings": [{"sample_type": "sunda", "sample_index": 0, "model_id": "A", "model_name": "Model A", "rating": 7}]}"#,
    )
    .unwrap();

    mosctl(&dir)
        .args(["submit", "--name", "Asep", "--email", "asep@example.org"])
        .args(["--ratings", "ratings.json"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("rating"));
}
