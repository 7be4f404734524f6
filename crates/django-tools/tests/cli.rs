//! End-to-end CLI tests.
//!
//! Every test runs offline: installs go through `install-from-cache`
//! against a seeded download cache, so no network and no version-control
//! clients are needed.

use std::fs::{self, File};
use std::path::Path;

use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;
use tempfile::TempDir;

fn django_tools() -> Command {
    Command::cargo_bin("django-tools").expect("binary builds")
}

/// Write a provisioning config into the build tree.
fn write_config(tree: &Path, part_options: &str) -> std::path::PathBuf {
    let config = tree.join("django-tools.yaml");
    fs::write(
        &config,
        format!(
            "build:\n  install-from-cache: true\nparts:\n  django:\n{part_options}"
        ),
    )
    .unwrap();
    config
}

/// Seed the download cache with a fake trunk checkout.
fn seed_checkout(tree: &Path) {
    let checkout = tree.join("downloads/django-svn");
    fs::create_dir_all(checkout.join("django")).unwrap();
    fs::write(checkout.join("django/__init__.py"), b"").unwrap();
    fs::write(checkout.join("setup.py"), b"# setup\n").unwrap();
}

/// Seed the download cache with a release tarball whose root directory does
/// not match the part name.
fn seed_tarball(tree: &Path, version: &str) {
    let source = tree.join("tarball-source");
    fs::create_dir_all(source.join("django")).unwrap();
    fs::write(source.join("django/__init__.py"), b"").unwrap();
    fs::write(source.join("setup.py"), b"# setup\n").unwrap();

    let downloads = tree.join("downloads");
    fs::create_dir_all(&downloads).unwrap();
    let tarball = downloads.join(format!("django-{version}.tar.gz"));
    let encoder = GzEncoder::new(File::create(&tarball).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder
        .append_dir_all(format!("Django-{version}"), &source)
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}

#[test]
fn help_lists_subcommands() {
    django_tools()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("update"));
}

#[test]
fn missing_config_is_reported() {
    django_tools()
        .args(["install", "--config", "/nonexistent/django-tools.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config"));
}

#[test]
fn missing_version_is_reported() {
    let tree = TempDir::new().unwrap();
    let config = write_config(tree.path(), "    project: myapp\n");

    django_tools()
        .args(["install", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("version"));
}

#[test]
fn offline_install_from_seeded_checkout() {
    let tree = TempDir::new().unwrap();
    seed_checkout(tree.path());
    let config = write_config(
        tree.path(),
        "    version: trunk\n    project: myapp\n    wsgi: \"true\"\n    test: app1 app2\n",
    );

    django_tools()
        .args(["install", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed part `django`"));

    let tree = tree.path();
    assert!(tree.join("parts/django/django/__init__.py").exists());
    assert!(tree.join("bin/django").exists());
    assert!(tree.join("bin/django.wsgi").exists());
    assert!(!tree.join("bin/django.fcgi").exists());
    assert!(tree.join("bin/test").exists());
    assert!(tree.join("myapp/settings.py").exists());
    assert!(tree.join("myapp/media").is_dir());

    let manage = fs::read_to_string(tree.join("bin/django")).unwrap();
    assert!(manage.contains("'myapp.development'"));

    let settings = fs::read_to_string(tree.join("myapp/settings.py")).unwrap();
    assert!(settings.contains("SECRET_KEY = '"));
}

#[test]
fn second_install_keeps_user_edits() {
    let tree = TempDir::new().unwrap();
    seed_checkout(tree.path());
    let config = write_config(tree.path(), "    version: trunk\n    project: myapp\n");

    django_tools()
        .args(["install", "--config"])
        .arg(&config)
        .assert()
        .success();

    let settings = tree.path().join("myapp/settings.py");
    fs::write(&settings, "# customized\n").unwrap();

    django_tools()
        .args(["install", "--config"])
        .arg(&config)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&settings).unwrap(), "# customized\n");
}

#[test]
fn offline_install_from_seeded_tarball() {
    let tree = TempDir::new().unwrap();
    seed_tarball(tree.path(), "1.3.1");
    let config = write_config(tree.path(), "    version: 1.3.1\n");

    django_tools()
        .args(["install", "--config"])
        .arg(&config)
        .assert()
        .success();

    assert!(tree.path().join("parts/django/setup.py").exists());
    assert!(tree.path().join("parts/django/django/__init__.py").exists());
    // The scratch extraction dir is cleaned up, the tarball kept.
    assert!(!tree.path().join("downloads/django-archive").exists());
    assert!(tree.path().join("downloads/django-1.3.1.tar.gz").exists());
}

#[test]
fn offline_install_fails_clearly_on_cache_miss() {
    let tree = TempDir::new().unwrap();
    let config = write_config(tree.path(), "    version: 1.3.1\n");

    django_tools()
        .args(["install", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("download cache has no entry"));
}

#[test]
fn update_is_noop_for_release_versions() {
    let tree = TempDir::new().unwrap();
    // Online config: the no-op must come from the version classification,
    // not from offline mode.
    let config = tree.path().join("django-tools.yaml");
    fs::write(&config, "parts:\n  django:\n    version: 1.3.1\n").unwrap();

    django_tools()
        .args(["update", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to update"));
}

#[test]
fn unknown_part_is_reported() {
    let tree = TempDir::new().unwrap();
    let config = write_config(tree.path(), "    version: 1.3.1\n");

    django_tools()
        .args(["install", "--part", "other", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no part named `other`"));
}
