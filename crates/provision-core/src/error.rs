//! Fatal user-facing provisioning failures.
//!
//! A [`UserError`] aborts the build with an actionable message naming the
//! implicated path or URL. Everything else (I/O, malformed configuration,
//! missing executables) propagates as a raw [`anyhow::Error`] chain.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("failed to download Django from {url}; check your internet connection")]
    DownloadFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to update the Django checkout at {}; check your internet connection", .path.display())]
    UpdateFailed { path: PathBuf },

    #[error("failed to check out Django from {url}; check your internet connection")]
    CheckoutFailed { url: String },

    #[error("failed to clone Django from {url}; check your internet connection")]
    CloneFailed { url: String },

    #[error("failed to pull the Django clone at {}; check your internet connection", .path.display())]
    PullFailed { path: PathBuf },

    #[error("failed to export `{reference}` from the Django clone at {}", .path.display())]
    ArchiveFailed { path: PathBuf, reference: String },

    #[error(
        "install-from-cache is set but the download cache has no entry at {}; \
         run once without install-from-cache to populate it",
        .path.display()
    )]
    CacheMiss { path: PathBuf },
}
