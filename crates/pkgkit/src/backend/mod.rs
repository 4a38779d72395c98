//! Package-manager adapter.
//!
//! The [`Backend`] trait describes how one package tool spells each
//! operation (as [`CommandSpec`]s). [`PackageManager`] is the closed set of
//! supported backends; it executes those commands through a
//! [`CommandRunner`] and enforces the refresh memoization held in a
//! [`Session`].

pub mod apt;
pub mod dnf;

use crate::error::{Error, ErrorCategory, Result};
use crate::exec::{CommandRunner, CommandSpec, ExecOutcome};
use crate::os::OsFamily;
use crate::session::Session;
use crate::types::{InstallOutcome, Package, Repository};
use std::sync::Arc;

pub use apt::AptBackend;
pub use dnf::DnfBackend;

/// Command vocabulary of one package tool.
///
/// Implementations only build commands; they never execute anything, which
/// keeps them trivially testable.
pub trait Backend: Send + Sync {
    /// Short tool name used in messages ("apt", "dnf").
    fn name(&self) -> &'static str;

    /// Family this backend serves.
    fn family(&self) -> OsFamily;

    /// Refresh package metadata.
    fn refresh_command(&self) -> CommandSpec;

    /// Install a batch of packages.
    fn install_command(&self, packages: &[Package]) -> CommandSpec;

    /// Remove a batch of packages.
    fn remove_command(&self, packages: &[Package]) -> CommandSpec;

    /// Query whether a package is installed.
    fn query_command(&self, name: &str) -> CommandSpec;

    /// Interpret the outcome of [`Backend::query_command`].
    fn query_matches(&self, outcome: &ExecOutcome) -> bool {
        outcome.is_success()
    }

    /// Commands that register a repository.
    fn repository_commands(&self, repository: &Repository) -> Result<Vec<CommandSpec>>;

    /// Commands that import a signing key.
    fn signing_key_commands(&self, url: &str, keyring: &str) -> Vec<CommandSpec>;

    /// Install a package group.
    fn group_command(&self, _group: &str) -> Result<CommandSpec> {
        Err(Error::Unsupported {
            operation: "install_group",
            manager: self.name(),
        })
    }
}

/// The supported package managers, selected once from the OS family.
#[derive(Clone)]
pub struct PackageManager {
    backend: Adapter,
    runner: Arc<dyn CommandRunner>,
}

#[derive(Debug, Clone)]
enum Adapter {
    Apt(AptBackend),
    Dnf(DnfBackend),
}

impl PackageManager {
    /// Build the adapter for a family.
    ///
    /// Returns [`Error::UnsupportedFamily`] for [`OsFamily::Unknown`].
    pub fn for_family(family: OsFamily, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let backend = match family {
            OsFamily::Debian => Adapter::Apt(AptBackend::new()),
            OsFamily::Rpm => Adapter::Dnf(DnfBackend::new()),
            OsFamily::Unknown => {
                return Err(Error::UnsupportedFamily {
                    family: family.to_string(),
                });
            }
        };
        Ok(Self { backend, runner })
    }

    fn backend(&self) -> &dyn Backend {
        match &self.backend {
            Adapter::Apt(b) => b,
            Adapter::Dnf(b) => b,
        }
    }

    /// Tool name ("apt" or "dnf").
    pub fn name(&self) -> &'static str {
        self.backend().name()
    }

    /// Family served by this adapter.
    pub fn family(&self) -> OsFamily {
        self.backend().family()
    }

    /// The runner used for every command.
    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Refresh package metadata once per session.
    pub fn refresh(&self, session: &mut Session) -> Result<()> {
        if session.is_refreshed() {
            log::debug!("{} metadata already refreshed this run", self.name());
            return Ok(());
        }

        log::info!("Refreshing {} package metadata", self.name());
        let outcome = self.runner.run(&self.backend().refresh_command());
        if !outcome.is_success() {
            return Err(Error::RefreshFailed {
                manager: self.name(),
                reason: outcome.describe(),
                category: ErrorCategory::from_outcome(&outcome),
            });
        }

        session.mark_refreshed();
        Ok(())
    }

    /// Install all packages in one batched call, refreshing first if needed.
    pub fn install(&self, session: &mut Session, packages: &[Package]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }

        self.refresh(session)?;

        log::info!(
            "Installing with {}: {}",
            self.name(),
            package_names(packages).join(" ")
        );
        let outcome = self.runner.run(&self.backend().install_command(packages));
        if !outcome.is_success() {
            return Err(Error::InstallFailed {
                manager: self.name(),
                packages: package_names(packages),
                reason: outcome.describe(),
                category: ErrorCategory::from_outcome(&outcome),
            });
        }
        Ok(())
    }

    /// Remove all packages in one batched call.
    pub fn remove(&self, _session: &mut Session, packages: &[Package]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }

        let outcome = self.runner.run(&self.backend().remove_command(packages));
        if !outcome.is_success() {
            return Err(Error::RemoveFailed {
                manager: self.name(),
                packages: package_names(packages),
                reason: outcome.describe(),
                category: ErrorCategory::from_outcome(&outcome),
            });
        }
        Ok(())
    }

    /// Whether a package is installed, via the native query tool.
    pub fn query_installed(&self, name: &str) -> bool {
        let outcome = self.runner.run(&self.backend().query_command(name));
        self.backend().query_matches(&outcome)
    }

    /// Install a package unless it is already present.
    pub fn install_if_missing(
        &self,
        session: &mut Session,
        package: &Package,
    ) -> Result<InstallOutcome> {
        if self.query_installed(&package.name) {
            log::info!("{} is already installed", package.name);
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        self.install(session, std::slice::from_ref(package))?;
        Ok(InstallOutcome::Installed)
    }

    /// Install only the packages not yet present, in one batch.
    ///
    /// Returns the names that were actually installed.
    pub fn install_missing(&self, session: &mut Session, packages: &[Package]) -> Result<Vec<String>> {
        let (present, missing): (Vec<&Package>, Vec<&Package>) = packages
            .iter()
            .partition(|p| self.query_installed(&p.name));

        for package in &present {
            log::info!("{} is already installed", package.name);
        }

        let missing: Vec<Package> = missing.into_iter().cloned().collect();
        self.install(session, &missing)?;
        Ok(package_names(&missing))
    }

    /// Register a repository and invalidate the session's refresh.
    pub fn add_repository(&self, session: &mut Session, repository: &Repository) -> Result<()> {
        log::info!("Adding repository {repository}");
        for command in self.backend().repository_commands(repository)? {
            let outcome = self.runner.run(&command);
            if !outcome.is_success() {
                return Err(Error::RepositoryFailed {
                    repository: repository.to_string(),
                    reason: outcome.describe(),
                });
            }
        }
        session.invalidate();
        Ok(())
    }

    /// Import a signing key and invalidate the session's refresh.
    ///
    /// `keyring` names the key file (apt: `/etc/apt/keyrings/<keyring>.gpg`).
    pub fn add_signing_key(&self, session: &mut Session, url: &str, keyring: &str) -> Result<()> {
        log::info!("Importing signing key {url}");
        for command in self.backend().signing_key_commands(url, keyring) {
            let outcome = self.runner.run(&command);
            if !outcome.is_success() {
                return Err(Error::SigningKeyFailed {
                    url: url.to_string(),
                    reason: outcome.describe(),
                });
            }
        }
        session.invalidate();
        Ok(())
    }

    /// Install a package group (RPM family only).
    pub fn install_group(&self, session: &mut Session, group: &str) -> Result<()> {
        let command = self.backend().group_command(group)?;
        self.refresh(session)?;

        log::info!("Installing group {group}");
        let outcome = self.runner.run(&command);
        if !outcome.is_success() {
            return Err(Error::GroupFailed {
                group: group.to_string(),
                reason: outcome.describe(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageManager")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

fn package_names(packages: &[Package]) -> Vec<String> {
    packages.iter().map(|p| p.name.clone()).collect()
}
