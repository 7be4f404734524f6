//! Framework source fetching.
//!
//! Three mutually exclusive strategies, selected from the classified
//! version in priority order: Subversion checkout > git clone+export >
//! release tarball download. Every strategy works against the shared
//! download cache and completes there before the installer touches the
//! previous install location.

pub mod git;
pub mod release;
pub mod svn;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::debug;

use crate::config::{BuildContext, Options};
use crate::source;

/// What a fetch strategy produced in the download cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// A release tarball, to be unpacked into place.
    Tarball(PathBuf),
    /// A source tree (Subversion checkout or git export), to be copied into
    /// place with the cache entry left intact.
    Tree(PathBuf),
}

/// Fetch the configured version into the download cache.
pub async fn fetch(ctx: &BuildContext, options: &Options) -> Result<Fetched> {
    let version = options.require("version")?;
    if source::is_checkout_url(version) {
        svn::fetch(ctx, version).await.map(Fetched::Tree)
    } else if source::is_git_install(options) {
        git::fetch(ctx, options, version).await.map(Fetched::Tree)
    } else {
        release::fetch(ctx, version).await.map(Fetched::Tarball)
    }
}

/// Run a command line through the shell and report whether it succeeded.
///
/// Stdout is swallowed unless the build is verbose; stderr always reaches
/// the user. Blocks until the command exits - there is no timeout layer.
pub(crate) async fn run_shell(command: &str, cwd: Option<&Path>, verbose: bool) -> Result<bool> {
    debug!(%command, "running shell command");
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    if !verbose {
        cmd.stdout(Stdio::null());
    }
    let status = cmd
        .status()
        .await
        .with_context(|| format!("failed to run `{command}`"))?;
    Ok(status.success())
}
