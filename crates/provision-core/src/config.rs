//! Part options and build-tree context.
//!
//! A build tree holds one or more named parts. Each part carries a flat
//! string key/value [`Options`] mapping (deserialized from the YAML config);
//! the tree-wide settings travel in an explicit [`BuildContext`] instead of
//! being looked up from ambient global state.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

/// Flat string key/value options for one named build part.
///
/// Values are kept as strings regardless of how they were spelled in YAML
/// (`wsgi: true` and `wsgi: "true"` are the same option), because every
/// option can end up substituted into a text template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    map: HashMap<String, String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// Value for `key`, or `default` when the option is unset.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Value for `key`, or an error naming the missing option.
    pub fn require(&self, key: &str) -> anyhow::Result<&str> {
        self.get(key)
            .ok_or_else(|| anyhow::anyhow!("part option `{key}` is not set"))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), value.into());
    }

    /// Insert `value` only when `key` is unset.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Boolean feature flags are spelled `"true"`, case-insensitively.
    pub fn is_true(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Non-empty trimmed lines of a newline-separated list option.
    pub fn lines(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whitespace-separated words of a list option.
    pub fn words(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| v.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.map.iter()
    }
}

impl<'de> Deserialize<'de> for Options {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = HashMap::<String, serde_yaml::Value>::deserialize(deserializer)?;
        let mut map = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let value = scalar_to_string(&value).ok_or_else(|| {
                serde::de::Error::custom(format!("part option `{key}` must be a scalar"))
            })?;
            map.insert(key, value);
        }
        Ok(Options { map })
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Build-tree-wide settings, passed explicitly into every component.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Root of the build tree; the project package is scaffolded here.
    pub directory: PathBuf,
    /// Where generated launcher scripts land.
    pub bin_directory: PathBuf,
    /// Parent of the per-part install locations.
    pub parts_directory: PathBuf,
    /// Shared download cache; persists across runs, never cleaned here.
    pub download_cache: PathBuf,
    /// Interpreter line for generated scripts.
    pub executable: String,
    /// Skip all network operations and rely on the download cache.
    pub install_from_cache: bool,
    /// Whether later build passes re-run the checkout update step.
    pub newest: bool,
    /// Show the output of invoked version-control clients.
    pub verbose: bool,
}

impl BuildContext {
    /// The install location owned by the named part.
    pub fn location(&self, part_name: &str) -> PathBuf {
        self.parts_directory.join(part_name)
    }
}
