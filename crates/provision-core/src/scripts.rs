//! Launcher script generation.
//!
//! Every enabled feature gets one executable Python stub in the bin
//! directory: the management launcher (always), a test runner (when a
//! space-separated app list is configured) and the WSGI/FCGI gateway
//! launchers (per-protocol boolean flag). Each stub prepends the computed
//! search paths to `sys.path` and invokes its entry point with the
//! project's settings module baked in.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{BuildContext, Options};

/// Gateway protocols a launcher can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Synchronous request/response handler.
    Wsgi,
    /// Persistent long-running server process.
    Fcgi,
}

impl Protocol {
    fn option_key(self) -> &'static str {
        match self {
            Protocol::Wsgi => "wsgi",
            Protocol::Fcgi => "fcgi",
        }
    }
}

/// Generate every configured launcher script and return the written paths.
pub fn generate_scripts(
    ctx: &BuildContext,
    part_name: &str,
    options: &Options,
    location: &Path,
) -> Result<Vec<PathBuf>> {
    let paths = search_paths(ctx, options, location);

    // A pre-built project package supplies the settings package instead of
    // the scaffolded project.
    let package = options
        .get("project-package")
        .or_else(|| options.get("project"))
        .unwrap_or("project");
    let settings_module = format!("{}.{}", package, options.get_or("settings", "development"));

    let control_script = options.get_or("control-script", part_name);
    let mut written = Vec::new();

    written.push(write_script(
        ctx,
        control_script,
        &paths,
        &manage_body(&settings_module),
    )?);

    let apps = options.words("test");
    if !apps.is_empty() {
        written.push(write_script(
            ctx,
            options.get_or("testrunner", "test"),
            &paths,
            &test_body(&settings_module, &apps),
        )?);
    }

    for protocol in [Protocol::Wsgi, Protocol::Fcgi] {
        if options.is_true(protocol.option_key()) {
            let name = format!("{}.{}", control_script, protocol.option_key());
            let logfile = options.get_or("logfile", "");
            written.push(write_script(
                ctx,
                &name,
                &paths,
                &gateway_body(protocol, &settings_module, logfile),
            )?);
        }
    }

    Ok(written)
}

/// The module search path for generated scripts: install location and build
/// root first, then configured extra paths, then libraries named by `.pth`
/// site files.
fn search_paths(ctx: &BuildContext, options: &Options, location: &Path) -> Vec<PathBuf> {
    let mut paths = vec![location.to_path_buf(), ctx.directory.clone()];
    for extra in options.lines("extra-paths") {
        paths.push(PathBuf::from(extra));
    }
    for site_dir in options.lines("pth-files") {
        let site_dir = Path::new(&site_dir);
        let libs = pth_libraries(site_dir);
        if libs.is_empty() {
            warn!(site_dir = %site_dir.display(), "no site *.pth libraries found");
        } else {
            info!(site_dir = %site_dir.display(), count = libs.len(), "adding *.pth libraries");
            paths.extend(libs);
        }
    }
    paths
}

/// Library paths named by the `*.pth` files in a site directory.
///
/// Follows Python's site-dir rules: blank lines, comments and `import`
/// lines are ignored; the rest are taken relative to the site directory and
/// kept only when they exist.
fn pth_libraries(site_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(site_dir) else {
        return Vec::new();
    };
    let mut libs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("pth") {
            continue;
        }
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with("import ")
                || line.starts_with("import\t")
            {
                continue;
            }
            let lib = site_dir.join(line);
            if lib.exists() {
                libs.push(lib);
            }
        }
    }
    libs
}

/// Write one executable launcher: interpreter line, `sys.path` setup, body.
fn write_script(
    ctx: &BuildContext,
    name: &str,
    paths: &[PathBuf],
    body: &str,
) -> Result<PathBuf> {
    let mut text = format!("#!{}\n\nimport sys\n\nsys.path[0:0] = [\n", ctx.executable);
    for path in paths {
        text.push_str(&format!("  '{}',\n", path.display()));
    }
    text.push_str("]\n");
    text.push_str(body);

    fs::create_dir_all(&ctx.bin_directory)
        .with_context(|| format!("failed to create {}", ctx.bin_directory.display()))?;
    let script_path = ctx.bin_directory.join(name);
    fs::write(&script_path, text)
        .with_context(|| format!("failed to write {}", script_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&script_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms)?;
    }

    info!(script = %script_path.display(), "generated launcher script");
    Ok(script_path)
}

fn manage_body(settings_module: &str) -> String {
    format!(
        r#"
import os

os.environ['DJANGO_SETTINGS_MODULE'] = '{settings_module}'

from django.core import management

if __name__ == '__main__':
    management.execute_from_command_line(sys.argv)
"#
    )
}

fn test_body(settings_module: &str, apps: &[String]) -> String {
    let app_args = apps
        .iter()
        .map(|app| format!("'{app}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"
import os

os.environ['DJANGO_SETTINGS_MODULE'] = '{settings_module}'

from django.core import management

if __name__ == '__main__':
    management.execute_from_command_line(
        [sys.argv[0], 'test', {app_args}] + sys.argv[1:])
"#
    )
}

/// Script body for a gateway launcher.
///
/// A pure function of the protocol - no shared template state is swapped
/// in and out around script writing.
fn gateway_body(protocol: Protocol, settings_module: &str, logfile: &str) -> String {
    match protocol {
        Protocol::Wsgi => format!(
            r#"
import os

os.environ['DJANGO_SETTINGS_MODULE'] = '{settings_module}'

logfile = '{logfile}'
if logfile:
    class Logger(object):
        def __init__(self, logfile):
            self.logfile = logfile

        def write(self, data):
            with open(self.logfile, 'a') as handle:
                handle.write(data)

    sys.stdout = sys.stderr = Logger(logfile)

import django.core.handlers.wsgi

application = django.core.handlers.wsgi.WSGIHandler()
"#
        ),
        Protocol::Fcgi => format!(
            r#"
import os

os.environ['DJANGO_SETTINGS_MODULE'] = '{settings_module}'

from django.core.servers.fastcgi import runfastcgi

runfastcgi(method='threaded', daemonize='false', outlog='{logfile}',
           errlog='{logfile}')
"#
        ),
    }
}
