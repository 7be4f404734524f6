//! Git clone and ref export.
//!
//! The clone lives in the download cache as `django-git` and is reused
//! across runs; the requested ref is exported with `git archive` into a
//! `django-git-archive/` subtree which the installer copies into place.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{BuildContext, Options};
use crate::error::UserError;
use crate::fetch::run_shell;
use crate::source;

const CLONE_DIR: &str = "django-git";
const ARCHIVE_DIR: &str = "django-git-archive";
const ARCHIVE_FILE: &str = "django-git.tar";

/// Fetch (or refresh) the clone, export `version`, and return the path of
/// the exported tree inside the cache.
pub async fn fetch(ctx: &BuildContext, options: &Options, version: &str) -> Result<PathBuf> {
    let clone = ctx.download_cache.join(CLONE_DIR);
    let export = clone.join(ARCHIVE_DIR);

    if ctx.install_from_cache {
        if !export.is_dir() {
            return Err(UserError::CacheMiss { path: export }.into());
        }
        info!(path = %clone.display(), "installing Django from previously cloned git repository");
        return Ok(export);
    }

    let url = source::git_url(options);
    if clone.exists() {
        pull(ctx, &clone).await?;
    } else {
        info!(%url, "cloning Django from git");
        let mut cmd = format!("git clone --depth 1 {} {}", url, clone.display());
        if !ctx.verbose {
            cmd.push_str(" -q");
        }
        if !run_shell(&cmd, None, ctx.verbose).await? {
            return Err(UserError::CloneFailed {
                url: url.to_string(),
            }
            .into());
        }
    }

    let cmd = format!(
        "git archive --format=tar --prefix={ARCHIVE_DIR}/ --output={ARCHIVE_FILE} {version}"
    );
    info!(reference = version, "exporting requested git ref");
    if !run_shell(&cmd, Some(&clone), ctx.verbose).await? {
        return Err(UserError::ArchiveFailed {
            path: clone,
            reference: version.to_string(),
        }
        .into());
    }
    unpack_export(&clone)?;
    Ok(export)
}

/// `git pull origin` against the existing clone. Failure is fatal; a stale
/// clone can be recovered by deleting the cache entry.
async fn pull(ctx: &BuildContext, clone: &Path) -> Result<()> {
    info!(path = %clone.display(), "updating Django clone from git");
    let mut cmd = String::from("git pull origin");
    if !ctx.verbose {
        cmd.push_str(" -q");
    }
    if !run_shell(&cmd, Some(clone), ctx.verbose).await? {
        return Err(UserError::PullFailed {
            path: clone.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

/// Unpack the exported tar inside the clone, replacing any export left over
/// from a previous run.
fn unpack_export(clone: &Path) -> Result<()> {
    let export = clone.join(ARCHIVE_DIR);
    if export.exists() {
        fs::remove_dir_all(&export)
            .with_context(|| format!("failed to remove stale export {}", export.display()))?;
    }
    let tar_path = clone.join(ARCHIVE_FILE);
    let file = File::open(&tar_path)
        .with_context(|| format!("failed to open {}", tar_path.display()))?;
    tar::Archive::new(file)
        .unpack(clone)
        .with_context(|| format!("failed to unpack {}", tar_path.display()))?;
    Ok(())
}
