//! # pkgkit
//!
//! Package management for Debian-like and RPM-like Linux distributions.
//!
//! This crate provides:
//! - Distribution detection from `os-release` ([`os`])
//! - A closed two-variant adapter over `apt` and `dnf` ([`PackageManager`])
//! - An explicit per-run [`Session`] that memoizes the package-cache refresh
//! - A fallible external-process abstraction with typed outcomes ([`exec`])
//!
//! ## Example
//!
//! ```no_run
//! use pkgkit::{os, Package, PackageManager, Session, SystemRunner};
//! use std::sync::Arc;
//!
//! let identity = os::detect();
//! let pm = PackageManager::for_family(identity.family, Arc::new(SystemRunner::new()))
//!     .expect("unsupported distribution");
//!
//! let mut session = Session::new();
//! pm.install(&mut session, &[Package::new("git"), Package::new("curl")])
//!     .expect("install failed");
//!
//! // Second install in the same session does not refresh again
//! pm.install_if_missing(&mut session, &Package::new("jq")).expect("install failed");
//! assert_eq!(session.refresh_count(), 1);
//! ```
//!
//! ## Refresh memoization
//!
//! Every [`PackageManager::install`] refreshes package metadata first, but only
//! once per [`Session`]. Adding a repository or a signing key invalidates the
//! session so the next install refreshes again.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod exec;
pub mod os;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use backend::PackageManager;
pub use error::{Error, ErrorCategory, Result};
pub use exec::{CommandRunner, CommandSpec, ExecOutcome, SystemRunner};
pub use os::{OsFamily, OsIdentity};
pub use session::Session;
pub use types::{InstallOutcome, Package, Repository};
