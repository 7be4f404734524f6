//! Release tarball downloads.
//!
//! Releases are cached as `django-<version>.tar.gz` in the download cache;
//! the network is only touched when that entry is absent. The download is
//! streamed straight to the cache file, and a failed download never leaves
//! a partial file behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use futures_util::StreamExt;
use tracing::info;
use url::Url;

use crate::config::BuildContext;
use crate::error::UserError;

const USER_AGENT: &str = concat!("django-tools/", env!("CARGO_PKG_VERSION"));

/// Name of the cache entry for a release version.
pub fn tarball_name(version: &str) -> String {
    format!("django-{version}.tar.gz")
}

/// Canonical release download location for a version.
fn download_url(version: &str) -> Result<Url> {
    let mut url = Url::parse("https://www.djangoproject.com/download/")
        .context("invalid release base URL")?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("release base URL cannot have path segments"))?
        .pop_if_empty()
        .push(version)
        .push("tarball")
        .push("");
    Ok(url)
}

/// Return the cached tarball for `version`, downloading it first if needed.
pub async fn fetch(ctx: &BuildContext, version: &str) -> Result<PathBuf> {
    let tarball = ctx.download_cache.join(tarball_name(version));

    if tarball.exists() {
        info!(path = %tarball.display(), "using cached release tarball");
        return Ok(tarball);
    }
    if ctx.install_from_cache {
        return Err(UserError::CacheMiss { path: tarball }.into());
    }

    let url = download_url(version)?;
    info!(%url, "downloading Django release");
    if let Err(source) = download_to(&url, &tarball).await {
        // Do not leave a truncated tarball for the next run to trust.
        let _ = fs::remove_file(&tarball);
        return Err(UserError::DownloadFailed {
            url: url.to_string(),
            source: source.into(),
        }
        .into());
    }
    Ok(tarball)
}

/// Stream an HTTP response body into `dest`.
async fn download_to(url: &Url, dest: &Path) -> Result<()> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("failed to fetch {url}"))?;
    if !response.status().is_success() {
        bail!("HTTP {}", response.status());
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).context("failed to create download cache directory")?;
    }
    let mut file = File::create(dest)
        .with_context(|| format!("failed to create {}", dest.display()))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("error reading download stream")?;
        file.write_all(&chunk).context("error writing to cache file")?;
    }
    Ok(())
}
