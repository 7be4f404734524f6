//! Declarative provisioning config.
//!
//! A YAML file with one `build` section for the tree-wide settings and a
//! `parts` mapping of named part option sets:
//!
//! ```yaml
//! build:
//!   executable: /usr/bin/python
//! parts:
//!   django:
//!     version: "1.3.1"
//!     project: myapp
//!     wsgi: "true"
//! ```
//!
//! Relative directories are resolved against the config file's parent
//! directory, so a checked-in config keeps working from anywhere.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use provision_core::{BuildContext, Options};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    build: BuildSection,
    parts: BTreeMap<String, Options>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BuildSection {
    directory: Option<PathBuf>,
    bin_directory: Option<PathBuf>,
    parts_directory: Option<PathBuf>,
    download_cache: Option<PathBuf>,
    executable: Option<String>,
    #[serde(default)]
    install_from_cache: bool,
    #[serde(default = "default_newest")]
    newest: bool,
}

fn default_newest() -> bool {
    true
}

/// Load and parse a provisioning config file.
pub fn load(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

impl ConfigFile {
    /// The build context described by the `build` section.
    pub fn context(&self, config_path: &Path, verbose: bool) -> BuildContext {
        let base = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let directory = match &self.build.directory {
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        };
        let join = |configured: &Option<PathBuf>, default: &str| {
            directory.join(
                configured
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(default)),
            )
        };

        BuildContext {
            bin_directory: join(&self.build.bin_directory, "bin"),
            parts_directory: join(&self.build.parts_directory, "parts"),
            download_cache: join(&self.build.download_cache, "downloads"),
            directory,
            executable: self
                .build
                .executable
                .clone()
                .unwrap_or_else(|| "/usr/bin/env python".to_string()),
            install_from_cache: self.build.install_from_cache,
            newest: self.build.newest,
            verbose,
        }
    }

    /// The part to provision: the requested one, or the only one defined.
    pub fn part(&self, requested: Option<&str>) -> Result<(&str, &Options)> {
        match requested {
            Some(name) => self
                .parts
                .get_key_value(name)
                .map(|(name, options)| (name.as_str(), options))
                .ok_or_else(|| anyhow::anyhow!("config defines no part named `{name}`")),
            None => {
                if self.parts.len() == 1 {
                    let (name, options) = self.parts.iter().next().expect("one part");
                    Ok((name.as_str(), options))
                } else {
                    bail!(
                        "config defines {} parts; pick one with --part",
                        self.parts.len()
                    );
                }
            }
        }
    }
}
