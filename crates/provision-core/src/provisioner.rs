//! The provisioning workflow for one named build part.
//!
//! `install` runs the full pipeline: classify the version, fetch into the
//! download cache, replace the install location, generate launcher scripts
//! and scaffold the project on first run. `update` is the lighter later
//! pass that only refreshes checkout-based installs.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{BuildContext, Options};
use crate::{fetch, install, scaffold, scripts, source};

/// Orchestrates provisioning for one named part.
pub struct Provisioner {
    name: String,
    ctx: BuildContext,
    options: Options,
}

/// What a later build pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The checkout at the install location was refreshed.
    Updated,
    /// Nothing to do: release install, offline mode, or `newest` disabled.
    Skipped,
}

impl Provisioner {
    /// Build a provisioner, filling in the option defaults the rest of the
    /// workflow relies on.
    pub fn new(name: impl Into<String>, ctx: BuildContext, mut options: Options) -> Self {
        options.set_default("project", "project");
        options.set_default("settings", "development");

        let urlconf = format!("{}.urls", options.get_or("project", "project"));
        options.set_default("urlconf", urlconf);
        options.set_default(
            "media_root",
            "os.path.join(os.path.dirname(__file__), 'media')",
        );

        // `pythonpath` is the historical spelling of `extra-paths`; keep
        // both populated so either works in templates and script paths.
        if let Some(extra) = options.get("extra-paths") {
            let extra = extra.to_string();
            options.set("pythonpath", extra);
        } else {
            let pythonpath = options.get_or("pythonpath", "").to_string();
            options.set("extra-paths", pythonpath);
        }

        options.set_default("wsgi", "false");
        options.set_default("fcgi", "false");
        options.set_default("wsgilog", "");
        options.set_default("logfile", "");

        Self {
            name: name.into(),
            ctx,
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The install location owned by this part.
    pub fn location(&self) -> PathBuf {
        self.ctx.location(&self.name)
    }

    /// Full install pass. Returns the install location.
    pub async fn install(&self) -> Result<PathBuf> {
        let location = self.location();

        fs::create_dir_all(&self.ctx.download_cache).with_context(|| {
            format!(
                "failed to create download cache {}",
                self.ctx.download_cache.display()
            )
        })?;
        fs::create_dir_all(&self.ctx.parts_directory).with_context(|| {
            format!(
                "failed to create parts directory {}",
                self.ctx.parts_directory.display()
            )
        })?;

        // The fetch completes into the cache before the previous install is
        // touched, so a failed fetch leaves the old tree intact.
        let fetched = fetch::fetch(&self.ctx, &self.options).await?;
        install::install(&self.ctx, &location, &fetched)?;

        let written = scripts::generate_scripts(&self.ctx, &self.name, &self.options, &location)?;
        info!(count = written.len(), "generated launcher scripts");

        // A pre-built project package replaces scaffolding entirely.
        if self.options.get("project-package").is_none() {
            let project = self.options.get_or("project", "project");
            let project_dir = self.ctx.directory.join(project);
            if project_dir.exists() {
                info!(%project, "skipping project creation: directory already exists");
            } else {
                scaffold::create_project(&self.options, &project_dir)?;
            }
        }

        Ok(location)
    }

    /// Later build pass: refresh checkout-based installs in place.
    ///
    /// Issues no command for release or git versions, when `newest` is
    /// disabled, or in offline mode.
    pub async fn update(&self) -> Result<UpdateOutcome> {
        if !self.ctx.newest || self.ctx.install_from_cache {
            return Ok(UpdateOutcome::Skipped);
        }
        let version = self.options.require("version")?;
        if !source::is_checkout_url(version) {
            return Ok(UpdateOutcome::Skipped);
        }
        fetch::svn::update(&self.ctx, &self.location(), version).await?;
        Ok(UpdateOutcome::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn context(root: &Path) -> BuildContext {
        BuildContext {
            directory: root.to_path_buf(),
            bin_directory: root.join("bin"),
            parts_directory: root.join("parts"),
            download_cache: root.join("downloads"),
            executable: "/usr/bin/env python".into(),
            install_from_cache: false,
            newest: true,
            verbose: false,
        }
    }

    fn provisioner(root: &Path, options: Options) -> Provisioner {
        Provisioner::new("django", context(root), options)
    }

    #[test]
    fn test_defaults_are_filled_in() {
        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path(), Options::new());
        assert_eq!(p.options().get("project"), Some("project"));
        assert_eq!(p.options().get("settings"), Some("development"));
        assert_eq!(p.options().get("urlconf"), Some("project.urls"));
        assert_eq!(p.options().get("wsgi"), Some("false"));
        assert_eq!(p.options().get("extra-paths"), Some(""));
    }

    #[test]
    fn test_urlconf_follows_configured_project() {
        let tmp = tempfile::tempdir().unwrap();
        let mut options = Options::new();
        options.set("project", "myapp");
        let p = provisioner(tmp.path(), options);
        assert_eq!(p.options().get("urlconf"), Some("myapp.urls"));
    }

    #[test]
    fn test_extra_paths_and_pythonpath_stay_in_sync() {
        let tmp = tempfile::tempdir().unwrap();

        let mut options = Options::new();
        options.set("extra-paths", "/opt/libs");
        let p = provisioner(tmp.path(), options);
        assert_eq!(p.options().get("pythonpath"), Some("/opt/libs"));

        let mut options = Options::new();
        options.set("pythonpath", "/srv/shared");
        let p = provisioner(tmp.path(), options);
        assert_eq!(p.options().get("extra-paths"), Some("/srv/shared"));
    }

    #[tokio::test]
    async fn test_update_is_noop_for_release_versions() {
        let tmp = tempfile::tempdir().unwrap();
        let mut options = Options::new();
        options.set("version", "1.3.1");
        let p = provisioner(tmp.path(), options);
        assert_eq!(p.update().await.unwrap(), UpdateOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_update_is_noop_when_newest_disabled() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = context(tmp.path());
        ctx.newest = false;
        let mut options = Options::new();
        options.set("version", "trunk");
        let p = Provisioner::new("django", ctx, options);
        assert_eq!(p.update().await.unwrap(), UpdateOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_update_is_noop_in_offline_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = context(tmp.path());
        ctx.install_from_cache = true;
        let mut options = Options::new();
        options.set("version", "trunk");
        let p = Provisioner::new("django", ctx, options);
        assert_eq!(p.update().await.unwrap(), UpdateOutcome::Skipped);
    }

    /// Full offline install from a seeded checkout cache: no network, no
    /// version-control client needed.
    #[tokio::test]
    async fn test_offline_install_from_seeded_checkout() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = context(tmp.path());
        ctx.install_from_cache = true;

        let checkout = ctx.download_cache.join("django-svn");
        fs::create_dir_all(checkout.join("django")).unwrap();
        fs::write(checkout.join("django/__init__.py"), b"").unwrap();
        fs::write(checkout.join("setup.py"), b"# setup\n").unwrap();

        let mut options = Options::new();
        options.set("version", "trunk");
        options.set("project", "myapp");
        options.set("wsgi", "true");
        let p = Provisioner::new("django", ctx.clone(), options);

        let location = p.install().await.unwrap();
        assert_eq!(location, ctx.parts_directory.join("django"));
        assert!(location.join("django/__init__.py").exists());
        assert!(ctx.bin_directory.join("django").exists());
        assert!(ctx.bin_directory.join("django.wsgi").exists());
        assert!(ctx.directory.join("myapp/settings.py").exists());

        // A second run must not disturb user edits to the project.
        let settings = ctx.directory.join("myapp/settings.py");
        fs::write(&settings, "# customized\n").unwrap();
        p.install().await.unwrap();
        assert_eq!(fs::read_to_string(&settings).unwrap(), "# customized\n");
    }

    #[tokio::test]
    async fn test_project_package_suppresses_scaffolding() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = context(tmp.path());
        ctx.install_from_cache = true;

        let checkout = ctx.download_cache.join("django-svn");
        fs::create_dir_all(&checkout).unwrap();

        let mut options = Options::new();
        options.set("version", "trunk");
        options.set("project-package", "mysite");
        let p = Provisioner::new("django", ctx.clone(), options);
        p.install().await.unwrap();

        assert!(!ctx.directory.join("project").exists());
        // Launchers target the packaged settings module instead.
        let script = fs::read_to_string(ctx.bin_directory.join("django")).unwrap();
        assert!(script.contains("'mysite.development'"));
    }
}
