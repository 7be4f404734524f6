//! Installing fetched sources into the part location.
//!
//! The install location is owned exclusively by its part: any previous
//! installation is removed and the location always reflects exactly one
//! version afterwards. Tarballs are unpacked through a scratch directory
//! in the download cache because release archives are not consistent about
//! their top-level directory name; checkout/clone trees are copied so the
//! cache entry stays available for later updates.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use tracing::info;
use walkdir::WalkDir;

use crate::config::BuildContext;
use crate::fetch::Fetched;

const EXTRACTION_DIR: &str = "django-archive";

/// Replace the install location with the fetched source.
pub fn install(ctx: &BuildContext, location: &Path, fetched: &Fetched) -> Result<()> {
    if location.exists() {
        fs::remove_dir_all(location).with_context(|| {
            format!("failed to remove previous install at {}", location.display())
        })?;
    }
    match fetched {
        Fetched::Tarball(tarball) => install_release(ctx, tarball, location),
        Fetched::Tree(cache) => {
            copy_tree(cache, location)?;
            info!(location = %location.display(), "installed Django from cache tree");
            Ok(())
        }
    }
}

/// Unpack a release tarball and move its single top-level entry into place.
fn install_release(ctx: &BuildContext, tarball: &Path, location: &Path) -> Result<()> {
    let extraction_dir = ctx.download_cache.join(EXTRACTION_DIR);
    if extraction_dir.exists() {
        // Scratch space left behind by an interrupted run.
        fs::remove_dir_all(&extraction_dir)
            .with_context(|| format!("failed to clear {}", extraction_dir.display()))?;
    }

    unpack_tar_gz(tarball, &extraction_dir)?;
    let unpacked = single_entry(&extraction_dir)?;
    move_tree(&unpacked, location)?;
    fs::remove_dir_all(&extraction_dir)
        .with_context(|| format!("failed to clean up {}", extraction_dir.display()))?;

    info!(location = %location.display(), "installed Django release");
    Ok(())
}

/// Unpack a gzip-compressed tarball into `dest`.
fn unpack_tar_gz(tarball: &Path, dest: &Path) -> Result<()> {
    let file = File::open(tarball)
        .with_context(|| format!("failed to open {}", tarball.display()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive
        .unpack(dest)
        .with_context(|| format!("failed to unpack {}", tarball.display()))?;
    Ok(())
}

/// The single top-level entry of an extraction directory. Release archives
/// are not trusted to name their root after the version.
fn single_entry(dir: &Path) -> Result<PathBuf> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
    {
        entries.push(entry?.path());
    }
    match entries.as_slice() {
        [only] => Ok(only.clone()),
        [] => bail!("archive unpacked into {} is empty", dir.display()),
        _ => bail!(
            "archive unpacked into {} has {} top-level entries, expected one",
            dir.display(),
            entries.len()
        ),
    }
}

/// Move a tree, falling back to copy+remove across filesystems.
fn move_tree(src: &Path, dest: &Path) -> Result<()> {
    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    copy_tree(src, dest)?;
    fs::remove_dir_all(src).with_context(|| format!("failed to remove {}", src.display()))?;
    Ok(())
}

/// Recursively copy a directory tree.
pub(crate) fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("failed to walk {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}
