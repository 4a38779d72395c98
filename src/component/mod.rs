//! Installable components.
//!
//! A component pairs an idempotency [`Check`] with an install action and an
//! optional post-install validator. The set of components is the static
//! [`catalog`]; profiles pick from it.

pub mod catalog;

use pkgkit::{
    CommandSpec, ErrorCategory, OsFamily, OsIdentity, Package, PackageManager, Repository, Session,
};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::checks::{Check, ValidationError};
use crate::probe::Probe;
use crate::ui;

/// Timeout for anything that downloads (clones, installer scripts)
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

pub type InstallFn = fn(&mut InstallEnv<'_>) -> Result<(), InstallError>;
pub type ValidateFn = fn(&dyn Probe) -> Result<(), ValidationError>;

/// One installable unit of the catalog.
#[derive(Clone, Copy)]
pub struct Component {
    pub key: &'static str,
    pub description: &'static str,
    pub check: Check,
    pub install: InstallFn,
    pub validate: Option<ValidateFn>,
    /// Keys of components this one needs; enforced by the install action
    pub requires: &'static [&'static str],
    /// Part of every profile
    pub mandatory: bool,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("key", &self.key)
            .field("check", &self.check)
            .field("requires", &self.requires)
            .field("mandatory", &self.mandatory)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Component {}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Package(#[from] pkgkit::Error),

    #[error("`{command}` {reason}")]
    Command { command: String, reason: String },

    #[error("prerequisite missing: {prerequisite}")]
    PrerequisiteMissing {
        component: &'static str,
        prerequisite: &'static str,
    },

    // No #[source]: the cause is already part of the message
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for InstallError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl InstallError {
    pub fn is_prerequisite(&self) -> bool {
        matches!(self, Self::PrerequisiteMissing { .. })
    }

    /// What to do about a package-manager failure, when it is recognisable.
    pub fn advice(&self) -> Option<String> {
        match self {
            Self::Package(err) => {
                let category = err.category();
                (category != ErrorCategory::Other)
                    .then(|| format!("{}: {}", category.description(), category.advice()))
            }
            _ => None,
        }
    }
}

/// Everything an install action may touch.
pub struct InstallEnv<'a> {
    pub pm: &'a PackageManager,
    pub session: &'a mut Session,
    pub probe: &'a dyn Probe,
    pub os: &'a OsIdentity,
    pub silent: bool,
}

impl InstallEnv<'_> {
    pub fn family(&self) -> OsFamily {
        self.pm.family()
    }

    pub fn home(&self) -> &Path {
        self.probe.home()
    }

    /// Run a command through the package manager's runner, returning stdout.
    pub fn run(&self, spec: CommandSpec) -> Result<String, InstallError> {
        let outcome = self.pm.runner().run(&spec);
        match outcome.stdout() {
            Some(stdout) => Ok(stdout.to_string()),
            None => Err(InstallError::Command {
                command: spec.display(),
                reason: outcome.describe(),
            }),
        }
    }

    /// Install whichever of `names` are missing, in one batch.
    pub fn install_packages(&mut self, names: &[&str]) -> Result<Vec<String>, InstallError> {
        let installed = self.pm.install_missing(self.session, &Package::many(names))?;
        let present = already_present(names, &installed);
        if !present.is_empty() {
            ui::dim(&format!("already installed: {}", present.join(", ")));
        }
        Ok(installed)
    }

    pub fn install_group(&mut self, group: &str) -> Result<(), InstallError> {
        Ok(self.pm.install_group(self.session, group)?)
    }

    pub fn add_repository(&mut self, repository: &Repository) -> Result<(), InstallError> {
        Ok(self.pm.add_repository(self.session, repository)?)
    }

    pub fn add_signing_key(&mut self, url: &str, keyring: &str) -> Result<(), InstallError> {
        Ok(self.pm.add_signing_key(self.session, url, keyring)?)
    }

    /// Shallow-clone `url` into `~/<dest>` unless the directory exists.
    pub fn clone_repo(&self, url: &str, dest: &str) -> Result<(), InstallError> {
        let path = self.probe.home_path(dest);
        if self.probe.is_dir(&path) {
            log::info!("{} already present", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut spec = CommandSpec::new("git").args(["clone", "--depth", "1"]);
        if self.silent {
            spec = spec.arg("--quiet");
        }
        self.run(
            spec.arg(url)
                .arg(path.to_string_lossy())
                .timeout(DOWNLOAD_TIMEOUT),
        )?;
        Ok(())
    }

    /// Download the installer script at `url`, then run it with
    /// `interpreter` (the script path goes before the interpreter's args).
    /// A failed download never reaches the interpreter.
    pub fn run_installer(&self, url: &str, interpreter: CommandSpec) -> Result<(), InstallError> {
        let script = std::env::temp_dir().join(format!(
            "dotstrap-{}-{}",
            std::process::id(),
            script_name(url)
        ));
        let script_arg = script.to_string_lossy().into_owned();

        self.run(
            CommandSpec::new("curl")
                .args(["-fsSL", "-o", script_arg.as_str(), url])
                .timeout(DOWNLOAD_TIMEOUT),
        )?;

        let mut spec = interpreter.timeout(DOWNLOAD_TIMEOUT).streamed();
        spec.args.insert(0, script_arg);
        let result = self.run(spec).map(drop);

        if let Err(e) = std::fs::remove_file(&script) {
            log::debug!("Could not remove {}: {e}", script.display());
        }
        result
    }
}

fn script_name(url: &str) -> &str {
    url.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("installer.sh")
}

/// Requested names the package manager did not have to install.
fn already_present<'a>(requested: &[&'a str], installed: &[String]) -> Vec<&'a str> {
    requested
        .iter()
        .copied()
        .filter(|name| !installed.iter().any(|i| i == name))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::InstallEnv;
    use crate::probe::FakeProbe;
    use pkgkit::testing::RecordingRunner;
    use pkgkit::{OsFamily, OsIdentity, PackageManager, Session};
    use std::sync::Arc;

    /// Recording runner, fake probe and session wired into an [`InstallEnv`].
    pub struct Harness {
        pub runner: Arc<RecordingRunner>,
        pub pm: PackageManager,
        pub session: Session,
        pub probe: FakeProbe,
        pub os: OsIdentity,
    }

    impl Harness {
        pub fn new(family: OsFamily, id: &str) -> Self {
            let runner = Arc::new(RecordingRunner::new());
            let pm = PackageManager::for_family(family, runner.clone()).unwrap();
            Self {
                runner,
                pm,
                session: Session::new(),
                probe: FakeProbe::new(),
                os: OsIdentity {
                    family,
                    id: id.to_string(),
                    version: String::new(),
                    pretty_name: None,
                },
            }
        }

        pub fn ubuntu() -> Self {
            Self::new(OsFamily::Debian, "ubuntu")
        }

        pub fn fedora() -> Self {
            let harness = Self::new(OsFamily::Rpm, "fedora");
            harness
                .runner
                .respond("rpm -q", pkgkit::ExecOutcome::failed(1, "not installed"));
            harness
        }

        pub fn env(&mut self) -> InstallEnv<'_> {
            InstallEnv {
                pm: &self.pm,
                session: &mut self.session,
                probe: &self.probe,
                os: &self.os,
                silent: true,
            }
        }
    }
}
