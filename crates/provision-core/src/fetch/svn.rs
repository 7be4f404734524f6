//! Subversion checkout and update.
//!
//! Checkouts live in the download cache as `django-<suffix>` and are
//! reused: an existing cache entry is updated in place, a missing one is
//! checked out fresh. Both operations go through the external `svn` client.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::config::BuildContext;
use crate::error::UserError;
use crate::fetch::run_shell;
use crate::source;

/// Fetch (or refresh) the checkout for a checkout-classified version and
/// return the cache path.
pub async fn fetch(ctx: &BuildContext, version: &str) -> Result<PathBuf> {
    let url = source::checkout_url(version);
    let cache = ctx
        .download_cache
        .join(format!("django-{}", source::cache_suffix(version)));

    if ctx.install_from_cache {
        if !cache.is_dir() {
            return Err(UserError::CacheMiss { path: cache }.into());
        }
        info!(path = %cache.display(), "installing Django from cache");
        return Ok(cache);
    }

    if cache.exists() {
        update(ctx, &cache, version).await?;
    } else {
        info!(%url, "checking out Django from svn");
        let mut cmd = format!("svn co {} {}", url, cache.display());
        if !ctx.verbose {
            cmd.push_str(" -q");
        }
        if !run_shell(&cmd, None, ctx.verbose).await? {
            return Err(UserError::CheckoutFailed {
                url: url.to_string(),
            }
            .into());
        }
    }
    Ok(cache)
}

/// Run `svn up` against an existing checkout, honoring a pinned revision.
///
/// Also used by the update path of a later build pass, directly against
/// the install location.
pub async fn update(ctx: &BuildContext, path: &Path, version: &str) -> Result<()> {
    info!(path = %path.display(), "updating Django from svn");
    let mut cmd = String::from("svn up");
    if let Some(rev) = source::pinned_revision(version) {
        cmd.push_str(" -r ");
        cmd.push_str(rev);
    }
    if !ctx.verbose {
        cmd.push_str(" -q");
    }
    if !run_shell(&cmd, Some(path), ctx.verbose).await? {
        return Err(UserError::UpdateFailed {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(())
}
