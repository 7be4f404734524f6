//! Version string classification.
//!
//! A part's `version` option can name a plain release (`1.3.1`), a
//! Subversion checkout URL (`http://`, `https://`, `svn://` or a tunneled
//! `svn+<scheme>://`, or the literal `trunk`), or - together with the `git`
//! option - a git ref. These rules decide which fetch strategy runs and
//! which download-cache entry it uses.

use crate::config::Options;

/// Canonical Subversion trunk URL, used when the version is `trunk`.
const TRUNK_URL: &str = "http://code.djangoproject.com/svn/django/trunk/";

/// Canonical git repository, used when the `git` option is just `true`.
const GIT_URL: &str = "git://github.com/django/django.git";

/// Whether the version string denotes a Subversion checkout.
///
/// Matching is case-sensitive and anchored: the string must start with one
/// of the known checkout schemes, or be exactly `trunk`.
pub fn is_checkout_url(version: &str) -> bool {
    if version == "trunk" {
        return true;
    }
    for scheme in ["http", "https", "svn"] {
        if version
            .strip_prefix(scheme)
            .is_some_and(|rest| rest.starts_with("://"))
        {
            return true;
        }
    }
    // Tunneled schemes: svn+ssh://, svn+my_tunnel://, ...
    if let Some(rest) = version.strip_prefix("svn+") {
        if let Some(idx) = rest.find("://") {
            let tunnel = &rest[..idx];
            return !tunnel.is_empty()
                && tunnel
                    .chars()
                    .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '_');
        }
    }
    false
}

/// The repository URL to check out for a checkout-classified version.
pub fn checkout_url(version: &str) -> &str {
    if version == "trunk" {
        TRUNK_URL
    } else {
        version
    }
}

/// Filesystem-safe download-cache suffix for a checkout version.
///
/// `trunk` maps to a fixed literal; anything else keeps the last non-empty
/// `/`-separated segment of the version string.
pub fn cache_suffix(version: &str) -> &str {
    if version == "trunk" {
        return "svn";
    }
    version
        .split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .unwrap_or(version)
}

/// A revision pinned with an `@<rev>` suffix, e.g.
/// `http://code.djangoproject.com/svn/django/trunk/@17394`.
pub fn pinned_revision(version: &str) -> Option<&str> {
    let (_, rev) = version.rsplit_once('@')?;
    if !rev.is_empty() && rev.chars().all(|c| c.is_ascii_digit()) {
        Some(rev)
    } else {
        None
    }
}

/// Whether the part opts into the git strategy, independent of the version
/// string.
pub fn is_git_install(options: &Options) -> bool {
    options.contains("git")
}

/// The git repository to clone: the `git` option itself, unless it is the
/// bare opt-in `true`.
pub fn git_url(options: &Options) -> &str {
    match options.get("git") {
        Some("true") | None => GIT_URL,
        Some(url) => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_urls_recognized() {
        assert!(is_checkout_url("trunk"));
        assert!(is_checkout_url("http://code.djangoproject.com/svn/django/trunk/"));
        assert!(is_checkout_url("https://example.org/svn/tags/1.2"));
        assert!(is_checkout_url("svn://example.org/django/trunk"));
        assert!(is_checkout_url("svn+ssh://dev@example.org/django"));
        assert!(is_checkout_url("svn+my_tunnel-x://example.org/django"));
    }

    #[test]
    fn test_release_identifiers_not_checkout_urls() {
        assert!(!is_checkout_url("1.3.1"));
        assert!(!is_checkout_url("1.0"));
        assert!(!is_checkout_url("trunk2"));
        assert!(!is_checkout_url("Trunk"));
        assert!(!is_checkout_url("ftp://example.org/django"));
        assert!(!is_checkout_url("svn+://example.org/django"));
        assert!(!is_checkout_url("my-svn://example.org"));
    }

    #[test]
    fn test_trunk_maps_to_canonical_url() {
        assert_eq!(checkout_url("trunk"), TRUNK_URL);
        assert_eq!(
            checkout_url("https://example.org/svn/tags/1.2"),
            "https://example.org/svn/tags/1.2"
        );
    }

    #[test]
    fn test_cache_suffix() {
        assert_eq!(cache_suffix("trunk"), "svn");
        assert_eq!(cache_suffix("some/path/1.2"), "1.2");
        assert_eq!(cache_suffix("http://example.org/svn/tags/1.2/"), "1.2");
        assert_eq!(cache_suffix("1.3.1"), "1.3.1");
    }

    #[test]
    fn test_pinned_revision() {
        assert_eq!(pinned_revision("http://example.org/svn/trunk/@17394"), Some("17394"));
        assert_eq!(pinned_revision("http://example.org/svn/trunk/"), None);
        assert_eq!(pinned_revision("svn+ssh://dev@example.org/django"), None);
        assert_eq!(pinned_revision("trunk@"), None);
    }

    #[test]
    fn test_git_classification() {
        let mut options = Options::new();
        assert!(!is_git_install(&options));
        options.set("git", "true");
        assert!(is_git_install(&options));
        assert_eq!(git_url(&options), GIT_URL);
        options.set("git", "git://example.org/fork.git");
        assert_eq!(git_url(&options), "git://example.org/fork.git");
    }
}
