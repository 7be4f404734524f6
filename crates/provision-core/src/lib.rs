//! Provision Core - Shared library for Django build provisioning
//!
//! This library turns a declarative part configuration into a working Django
//! installation inside a build tree:
//!
//! - **Version classification** - decide whether a version string names a
//!   Subversion checkout, a git ref, or a plain release
//! - **Fetching** - download release tarballs or drive the `svn`/`git`
//!   clients, always through a shared download cache
//! - **Installing** - replace the per-part install location with exactly one
//!   fetched version
//! - **Scaffolding** - one-shot creation of a project package with settings,
//!   url routing and a generated secret key
//! - **Script generation** - executable launcher scripts for management
//!   commands, the test runner and the WSGI/FCGI gateway protocols
//!
//! The [`Provisioner`] ties these together; CLI binaries supply a
//! [`BuildContext`] and the part [`Options`] and call
//! [`Provisioner::install`] or [`Provisioner::update`].

pub mod config;
pub mod error;
pub mod fetch;
pub mod install;
pub mod provisioner;
pub mod scaffold;
pub mod scripts;
pub mod source;

// Re-export main types for convenience
pub use config::{BuildContext, Options};
pub use error::UserError;
pub use provisioner::{Provisioner, UpdateOutcome};
