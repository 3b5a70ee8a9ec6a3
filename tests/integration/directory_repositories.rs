//! Local directory repositories copied into the cache

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use vcsdeps::cache::CacheRoot;
use vcsdeps::checkout::{CheckoutEngine, Freshness};
use vcsdeps::repository::VcsKind;
use vcsdeps::settings::{SettingsLoader, SettingsRequest, default_chain};
use vcsdeps::test_utils::{FakeVcsRunner, SettingsFixture};
use vcsdeps::utils::stable_path_hash;
use vcsdeps::vcs::VcsTool;

fn engine(home: &Path) -> Arc<CheckoutEngine<FakeVcsRunner>> {
    Arc::new(CheckoutEngine::new(CacheRoot::new(home), FakeVcsRunner::new(), VcsTool::git("git")))
}

fn write_source(dir: &Path, content: &str) -> Result<()> {
    std::fs::create_dir_all(dir.join("src"))?;
    std::fs::write(dir.join("src/lib.txt"), content)?;
    Ok(())
}

/// A relative `dir` is resolved against the settings root and copied under `vcs/<hash>`.
#[tokio::test]
async fn test_relative_directory_repository_is_copied() -> Result<()> {
    let temp = TempDir::new()?;
    let home = temp.path().join("home");
    let project = temp.path().join("project");
    let source = temp.path().join("lib");
    write_source(&source, "v1")?;
    SettingsFixture::new()
        .dependency("org.example:lib:1.0")
        .directory_repository("lib", Path::new("../lib"))
        .maven_mapping("lib", "org.example:lib")
        .write_to(&project)?;
    let engine = engine(&home);

    let settings = default_chain(engine.clone())
        .find_and_load_settings(&SettingsRequest::discover(&project))
        .await?;

    let expected = home.join("vcs").join(stable_path_hash(&source.canonicalize()?));
    let builds = settings.included_builds();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].root_dir, expected);
    assert_eq!(std::fs::read_to_string(expected.join("src/lib.txt"))?, "v1");
    assert!(expected.join("settings.toml").is_file());
    assert!(engine.runner().commands().is_empty());

    Ok(())
}

/// Each checkout replaces the previous copy, so edits to the source show up.
#[tokio::test]
async fn test_directory_checkout_tracks_source_changes() -> Result<()> {
    let temp = TempDir::new()?;
    let source = temp.path().join("lib");
    write_source(&source, "v1")?;
    std::fs::write(source.join("removed.txt"), "gone soon")?;
    let engine = engine(&temp.path().join("home"));
    let kind = VcsKind::directory(&source);

    let first = engine.checkout("lib", &kind).await?;
    assert_eq!(first.freshness, Freshness::Copied);

    write_source(&source, "v2")?;
    std::fs::remove_file(source.join("removed.txt"))?;
    let second = engine.checkout("lib", &kind).await?;

    assert_eq!(second.working_dir, first.working_dir);
    assert_eq!(std::fs::read_to_string(second.working_dir.join("src/lib.txt"))?, "v2");
    assert!(!second.working_dir.join("removed.txt").exists());

    Ok(())
}

/// Two repositories pointing at different directories never share a destination.
#[tokio::test]
async fn test_distinct_sources_get_distinct_destinations() -> Result<()> {
    let temp = TempDir::new()?;
    let a = temp.path().join("a");
    let b = temp.path().join("b");
    write_source(&a, "a")?;
    write_source(&b, "b")?;
    let engine = engine(&temp.path().join("home"));

    let first = engine.checkout("same", &VcsKind::directory(&a)).await?;
    let second = engine.checkout("same", &VcsKind::directory(&b)).await?;

    assert_ne!(first.working_dir, second.working_dir);
    assert_eq!(std::fs::read_to_string(first.working_dir.join("src/lib.txt"))?, "a");
    assert_eq!(std::fs::read_to_string(second.working_dir.join("src/lib.txt"))?, "b");

    Ok(())
}

/// Symlinks in the source are recreated in the copy.
#[cfg(unix)]
#[tokio::test]
async fn test_directory_checkout_keeps_symlinks() -> Result<()> {
    let temp = TempDir::new()?;
    let source = temp.path().join("lib");
    write_source(&source, "v1")?;
    std::os::unix::fs::symlink("src/lib.txt", source.join("link.txt"))?;
    std::os::unix::fs::symlink("src", source.join("sources"))?;
    let engine = engine(&temp.path().join("home"));

    let result = engine.checkout("lib", &VcsKind::directory(&source)).await?;

    let copy = &result.working_dir;
    assert!(std::fs::symlink_metadata(copy.join("link.txt"))?.file_type().is_symlink());
    assert_eq!(std::fs::read_to_string(copy.join("link.txt"))?, "v1");
    assert_eq!(std::fs::read_to_string(copy.join("sources/lib.txt"))?, "v1");

    // A second checkout replaces the links without tripping over them.
    let again = engine.checkout("lib", &VcsKind::directory(&source)).await?;
    assert_eq!(std::fs::read_to_string(again.working_dir.join("link.txt"))?, "v1");

    Ok(())
}
