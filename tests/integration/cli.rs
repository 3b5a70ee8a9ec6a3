//! Tests of the `vcsdeps` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

use vcsdeps::test_utils::SettingsFixture;

/// `vcsdeps` isolated from the user's home and global config.
fn vcsdeps(temp: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vcsdeps").unwrap();
    cmd.env("VCSDEPS_USER_HOME", temp.join("home"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(temp.join("config.toml"))
        .current_dir(temp);
    cmd
}

#[test]
fn test_cache_path_prints_user_home() {
    let temp = TempDir::new().unwrap();

    vcsdeps(temp.path())
        .args(["cache", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(temp.path().join("home").display().to_string()));
}

#[test]
fn test_cache_clean_counts_checkouts() {
    let temp = TempDir::new().unwrap();
    let home = temp.path().join("home");
    std::fs::create_dir_all(home.join("gits/gradle/.git")).unwrap();
    std::fs::create_dir_all(home.join("vcs/0123456789abcdef")).unwrap();

    vcsdeps(temp.path())
        .args(["cache", "clean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 checkout(s)"));

    assert!(!home.join("gits").exists());
    assert!(!home.join("vcs").exists());
}

#[test]
fn test_resolve_lists_mapped_repository() {
    let temp = TempDir::new().unwrap();
    SettingsFixture::gradle().write_to(temp.path()).unwrap();

    vcsdeps(temp.path())
        .args(["resolve", "org.gradle:tooling-api:1.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gradle git(https://github.com/gradle/gradle)"))
        .stdout(predicate::str::contains(
            "maven(org.gradle:tooling-api) provides org.gradle:tooling-api:1.0",
        ));

    // Nothing is checked out by a resolve.
    assert!(!temp.path().join("home").exists());
}

#[test]
fn test_resolve_defaults_to_declared_dependencies() {
    let temp = TempDir::new().unwrap();
    let settings = SettingsFixture::gradle().write_to(&temp.path().join("build")).unwrap();

    vcsdeps(temp.path())
        .arg("--settings")
        .arg(&settings)
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("provides org.gradle:tooling-api:1.0"));
}

#[test]
fn test_resolve_rejects_malformed_coordinate() {
    let temp = TempDir::new().unwrap();
    SettingsFixture::gradle().write_to(temp.path()).unwrap();

    vcsdeps(temp.path())
        .args(["resolve", "not-a-coordinate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not-a-coordinate"));
}

#[test]
fn test_missing_settings_is_reported() {
    let temp = TempDir::new().unwrap();

    vcsdeps(temp.path())
        .arg("checkout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("settings.toml not found"))
        .stderr(predicate::str::contains("--settings"));
}

#[test]
fn test_checkout_copies_directory_repository() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("lib");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("README.md"), "# lib\n").unwrap();
    SettingsFixture::new()
        .dependency("org.example:lib:1.0")
        .directory_repository("lib", &source)
        .maven_mapping("lib", "org.example:lib")
        .write_to(&temp.path().join("build"))
        .unwrap();

    vcsdeps(temp.path())
        .current_dir(temp.path().join("build"))
        .arg("checkout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Included 1 build(s):"))
        .stdout(predicate::str::contains("repository 'lib'"));

    let copies: Vec<_> = std::fs::read_dir(temp.path().join("home/vcs"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(copies.len(), 1);
    assert!(copies[0].join("README.md").is_file());
    assert!(copies[0].join("settings.toml").is_file());
}

#[test]
fn test_checkout_without_unresolved_dependencies() {
    let temp = TempDir::new().unwrap();
    SettingsFixture::new().write_to(temp.path()).unwrap();

    vcsdeps(temp.path())
        .arg("checkout")
        .assert()
        .success()
        .stdout(predicate::str::contains("No builds included"));
}
