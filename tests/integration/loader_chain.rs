//! Settings evaluation through the standard loader chain

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use vcsdeps::cache::CacheRoot;
use vcsdeps::checkout::CheckoutEngine;
use vcsdeps::core::VcsError;
use vcsdeps::settings::{BuildOrigin, SettingsLoader, SettingsRequest, default_chain};
use vcsdeps::test_utils::{FakeVcsRunner, SettingsFixture, init_test_logging};
use vcsdeps::vcs::VcsTool;

fn engine(home: &Path, runner: FakeVcsRunner) -> Arc<CheckoutEngine<FakeVcsRunner>> {
    Arc::new(CheckoutEngine::new(CacheRoot::new(home), runner, VcsTool::git("git")))
}

/// A repository mapped to an unresolved dependency ends up as the only included build.
#[tokio::test]
async fn test_unresolved_dependency_checks_out_mapped_repository() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let home = temp.path().join("home");
    let project = temp.path().join("project");
    SettingsFixture::gradle().write_to(&project)?;
    let engine = engine(&home, FakeVcsRunner::new());

    let settings = default_chain(engine.clone())
        .find_and_load_settings(&SettingsRequest::discover(&project))
        .await?;

    let checkout = home.join("gits").join("gradle");
    assert!(checkout.is_dir());
    assert!(checkout.join("settings.toml").is_file());
    assert!(home.join("CACHEDIR.TAG").is_file());

    let builds = settings.included_builds();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].name, "gradle");
    assert_eq!(builds[0].root_dir, checkout);
    assert_eq!(builds[0].origin, BuildOrigin::Repository("gradle".to_string()));
    assert!(builds[0].substitutions.is_empty());

    assert_eq!(
        engine.runner().command_lines(),
        [format!("git clone https://github.com/gradle/gradle {}", checkout.display())]
    );

    Ok(())
}

/// Loading again reuses the checkout and pulls instead of cloning.
#[tokio::test]
async fn test_second_load_pulls_existing_checkout() -> Result<()> {
    let temp = TempDir::new()?;
    let home = temp.path().join("home");
    let project = temp.path().join("project");
    SettingsFixture::gradle().write_to(&project)?;
    let engine = engine(&home, FakeVcsRunner::new().with_file("settings.toml", "dependencies = []\n"));
    let chain = default_chain(engine.clone());

    chain.find_and_load_settings(&SettingsRequest::discover(&project)).await?;
    let settings = chain.find_and_load_settings(&SettingsRequest::discover(&project)).await?;

    assert_eq!(settings.included_builds().len(), 1);
    let lines = engine.runner().command_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("git clone "));
    assert_eq!(lines[1], "git pull https://github.com/gradle/gradle");

    // The checkout's own settings file is left as the clone produced it.
    let content = std::fs::read_to_string(home.join("gits/gradle/settings.toml"))?;
    assert_eq!(content, "dependencies = []\n");

    Ok(())
}

/// A dependency substituted by an ScmBuild is not resolved again through source control.
#[tokio::test]
async fn test_scm_build_substitution_satisfies_dependency() -> Result<()> {
    let temp = TempDir::new()?;
    let home = temp.path().join("home");
    let project = temp.path().join("project");
    SettingsFixture::gradle()
        .git_scm_build(
            "tooling",
            "https://example.com/tooling.git",
            &[("org.gradle:tooling-api", ":tooling-api")],
        )
        .write_to(&project)?;
    let engine = engine(&home, FakeVcsRunner::new());

    let settings = default_chain(engine.clone())
        .find_and_load_settings(&SettingsRequest::discover(&project))
        .await?;

    let builds = settings.included_builds();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].origin, BuildOrigin::ScmBuild("tooling".to_string()));
    assert_eq!(builds[0].substitutions.rules()[0].to_string(), "org.gradle:tooling-api -> project :tooling-api");
    assert!(!home.join("gits/gradle").exists());
    assert_eq!(engine.runner().commands().len(), 1);

    Ok(())
}

/// Dependencies nothing maps leave the settings without included builds.
#[tokio::test]
async fn test_unmapped_dependency_is_left_alone() -> Result<()> {
    let temp = TempDir::new()?;
    let home = temp.path().join("home");
    let project = temp.path().join("project");
    SettingsFixture::new()
        .dependency("org.example:unknown:2.0")
        .git_repository("gradle", "https://github.com/gradle/gradle")
        .maven_mapping("gradle", "org.gradle:tooling-api")
        .write_to(&project)?;
    let engine = engine(&home, FakeVcsRunner::new());

    let settings = default_chain(engine.clone())
        .find_and_load_settings(&SettingsRequest::discover(&project))
        .await?;

    assert!(settings.included_builds().is_empty());
    assert!(engine.runner().commands().is_empty());

    Ok(())
}

/// A failing clone aborts the load with the command, exit code and destination.
#[tokio::test]
async fn test_failed_clone_reports_command() -> Result<()> {
    let temp = TempDir::new()?;
    let home = temp.path().join("home");
    let project = temp.path().join("project");
    SettingsFixture::gradle().write_to(&project)?;
    let engine = engine(&home, FakeVcsRunner::failing(Some(128)));

    let err = default_chain(engine)
        .find_and_load_settings(&SettingsRequest::discover(&project))
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("Failed to prepare repository 'gradle'"));
    match err.downcast_ref::<VcsError>() {
        Some(VcsError::CheckoutFailed {
            exit_code,
            destination,
            stderr,
            ..
        }) => {
            assert_eq!(*exit_code, Some(128));
            assert_eq!(destination, &home.join("gits/gradle"));
            assert!(stderr.contains("simulated failure"));
        }
        other => panic!("expected CheckoutFailed, got {other:?}"),
    }

    Ok(())
}

/// Mapping the same module twice is rejected while evaluating the file.
#[tokio::test]
async fn test_duplicate_mapping_in_settings_file() -> Result<()> {
    let temp = TempDir::new()?;
    let project = temp.path().join("project");
    SettingsFixture::gradle().maven_mapping("gradle", "org.gradle:tooling-api").write_to(&project)?;
    let engine = engine(&temp.path().join("home"), FakeVcsRunner::new());

    let err = default_chain(engine)
        .find_and_load_settings(&SettingsRequest::discover(&project))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Cannot add the same mapping twice: maven(org.gradle:tooling-api) is already mapped to repository 'gradle'"
    );

    Ok(())
}
