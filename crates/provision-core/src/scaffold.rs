//! One-shot project scaffolding.
//!
//! Creates the project package next to the build tree root: settings for
//! development and production, url routing, a freshly generated secret key,
//! `media/` and `templates/` directories and a package marker. The
//! directory is created at most once and individual files are only written
//! when absent, so user edits survive every later run.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use rand::Rng;
use tracing::info;

use crate::config::Options;

const SETTINGS_TEMPLATE: &str = r#"
import os

ADMINS = (
    # ('Your Name', 'your_email@domain.com'),
)

MANAGERS = ADMINS

DATABASES = {
    'default': {
        'ENGINE': 'django.db.backends.sqlite3',
        'NAME': '%(project)s.db',
    },
}

TIME_ZONE = 'America/Chicago'

LANGUAGE_CODE = 'en-us'

# Absolute path to the directory that holds media.
# Example: "/home/media/media.lawrence.com/"
MEDIA_ROOT = %(media_root)s

# URL that handles the media served from MEDIA_ROOT. Make sure to use a
# trailing slash if there is a path component (optional in other cases).
# Examples: "http://media.lawrence.com", "http://example.com/media/"
MEDIA_URL = '/media/'

# URL prefix for admin media -- CSS, JavaScript and images. Make sure to use a
# trailing slash.
# Examples: "http://foo.com/media/", "/media/".
ADMIN_MEDIA_PREFIX = '/admin_media/'

# Don't share this with anybody.
SECRET_KEY = '%(secret)s'

MIDDLEWARE_CLASSES = (
    'django.middleware.common.CommonMiddleware',
    'django.contrib.sessions.middleware.SessionMiddleware',
    'django.contrib.auth.middleware.AuthenticationMiddleware',
    'django.middleware.doc.XViewMiddleware',
)

ROOT_URLCONF = '%(urlconf)s'

INSTALLED_APPS = (
    'django.contrib.auth',
    'django.contrib.contenttypes',
    'django.contrib.sessions',
    'django.contrib.admin',
)

TEMPLATE_LOADERS = (
    'django.template.loaders.filesystem.load_template_source',
    'django.template.loaders.app_directories.load_template_source',
)

TEMPLATE_DIRS = (
    os.path.join(os.path.dirname(__file__), "templates"),
)


"#;

const PRODUCTION_TEMPLATE: &str = r#"
from %(project)s.settings import *
"#;

const DEVELOPMENT_TEMPLATE: &str = r#"
from %(project)s.settings import *

DEBUG = True
TEMPLATE_DEBUG = DEBUG
"#;

const URLS_TEMPLATE: &str = r#"
from django.conf.urls.defaults import patterns, include, handler500
from django.conf import settings
from django.contrib import admin


admin.autodiscover()

handler500 # Pyflakes

urlpatterns = patterns(
    '',
    (r'^admin/(.*)', admin.site.root),
    (r'^accounts/login/$', 'django.contrib.auth.views.login'),
)

if settings.DEBUG:
    urlpatterns += patterns('',
        (r'^media/(?P<path>.*)$', 'django.views.static.serve',
         {'document_root': settings.MEDIA_ROOT}),
    )
"#;

const SECRET_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*(-_=+)";
const SECRET_LEN: usize = 50;

/// A fresh settings secret: 50 characters drawn uniformly from lowercase
/// letters, digits and `!@#$%^&*(-_=+)`.
pub fn generate_secret() -> String {
    let mut rng = rand::rng();
    (0..SECRET_LEN)
        .map(|_| SECRET_CHARS[rng.random_range(0..SECRET_CHARS.len())] as char)
        .collect()
}

/// Literal `%(name)s` substitution against the variable map.
///
/// No escaping or validation happens here; a placeholder with no matching
/// variable is an error, stray `%` characters pass through untouched.
pub(crate) fn render(template: &str, vars: &HashMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("%(") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find(")s") else {
            bail!("unterminated %(...)s placeholder in template");
        };
        let name = &after[..end];
        let value = vars
            .get(name)
            .ok_or_else(|| anyhow!("template references unset option `{name}`"))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Render a template into `path`, skipping silently when the file exists.
fn create_file(path: &Path, template: &str, vars: &HashMap<String, String>) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    let content = render(template, vars)?;
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Create the project package at `project_dir`.
///
/// Template variables are the generated secret plus every part option;
/// options take precedence on key collision.
pub fn create_project(options: &Options, project_dir: &Path) -> Result<()> {
    fs::create_dir_all(project_dir)
        .with_context(|| format!("failed to create {}", project_dir.display()))?;

    let mut vars = HashMap::new();
    vars.insert("secret".to_string(), generate_secret());
    for (key, value) in options.iter() {
        vars.insert(key.clone(), value.clone());
    }

    create_file(&project_dir.join("development.py"), DEVELOPMENT_TEMPLATE, &vars)?;
    create_file(&project_dir.join("production.py"), PRODUCTION_TEMPLATE, &vars)?;
    create_file(&project_dir.join("urls.py"), URLS_TEMPLATE, &vars)?;
    create_file(&project_dir.join("settings.py"), SETTINGS_TEMPLATE, &vars)?;

    fs::create_dir_all(project_dir.join("media"))?;
    fs::create_dir_all(project_dir.join("templates"))?;

    // Package marker so the project directory imports as a Python package.
    let marker = project_dir.join("__init__.py");
    if !marker.exists() {
        fs::write(&marker, "")
            .with_context(|| format!("failed to write {}", marker.display()))?;
    }

    info!(project = %project_dir.display(), "created project skeleton");
    Ok(())
}
