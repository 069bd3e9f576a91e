//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `bookctl` with HOME and cwd pointed at an empty directory and the
/// override variables cleared, so no real config or .env leaks in.
fn bookctl(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bookctl").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("BOOKCTL_PORT")
        .env_remove("BOOKCTL_ENV")
        .env_remove("BOOK_DB_DSN")
        .env_remove("RUST_LOG");
    cmd
}

// === Help ===

#[test]
fn test_top_level_help() {
    let home = TempDir::new().unwrap();
    bookctl(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_serve_help() {
    let home = TempDir::new().unwrap();
    bookctl(&home)
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--db-dsn"))
        .stdout(predicate::str::contains("--db-max-idle-time"));
}

// === Serve ===

#[test]
fn test_serve_requires_dsn() {
    let home = TempDir::new().unwrap();
    bookctl(&home)
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("database DSN not set"));
}

#[test]
fn test_serve_rejects_unknown_env() {
    let home = TempDir::new().unwrap();
    bookctl(&home)
        .args(["serve", "--env", "qa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown environment"));
}

#[test]
fn test_serve_rejects_bad_env_var() {
    let home = TempDir::new().unwrap();
    bookctl(&home)
        .arg("serve")
        .env("BOOKCTL_PORT", "not-a-port")
        .assert()
        .failure()
        .stderr(predicate::str::contains("BOOKCTL_PORT"));
}

// === Config ===

#[test]
fn test_config_path() {
    let home = TempDir::new().unwrap();
    bookctl(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".bookctl/config.toml"));
}

#[test]
fn test_config_show_applies_env() {
    let home = TempDir::new().unwrap();
    bookctl(&home)
        .args(["config", "show"])
        .env("BOOKCTL_PORT", "8088")
        .env("BOOK_DB_DSN", "postgres://secret@db/books")
        .assert()
        .success()
        .stdout(predicate::str::contains("port = 8088"))
        .stdout(predicate::str::contains("secret").not());
}

#[test]
fn test_config_init_then_refuses_overwrite() {
    let home = TempDir::new().unwrap();
    bookctl(&home).args(["config", "init"]).assert().success();
    assert!(home.path().join(".bookctl/config.toml").exists());

    bookctl(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    bookctl(&home).args(["config", "init", "--force"]).assert().success();
}

#[test]
fn test_config_file_values_are_used() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join(".bookctl");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "[server]\nenv = \"staging\"\n").unwrap();

    bookctl(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("env = \"staging\""));
}

// === Completions ===

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    bookctl(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bookctl"));
}
