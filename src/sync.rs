//! Hand-off to the dotfiles sync script (a GNU Stow wrapper) and
//! verification of the symlinks it should have created.

use pkgkit::{CommandRunner, CommandSpec};
use std::path::PathBuf;
use thiserror::Error;

use crate::checks::{self, ValidationError};
use crate::config::Config;
use crate::probe::Probe;
use crate::ui;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync command not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error(transparent)]
    NotRunnable(#[from] ValidationError),

    #[error("`{command}` {reason}")]
    Failed { command: String, reason: String },

    #[error("{} symlink(s) missing after sync", failures.len())]
    Links { failures: Vec<ValidationError> },
}

#[derive(Debug, Clone)]
pub struct SyncStep {
    pub command: PathBuf,
    pub backup: bool,
    /// Paths relative to `$HOME` expected to be symlinks afterwards
    pub verify_links: Vec<String>,
}

impl SyncStep {
    pub fn from_config(config: &Config) -> Self {
        Self {
            command: config.sync_command(),
            backup: config.sync.backup,
            verify_links: config.sync.verify_links.clone(),
        }
    }

    pub fn invocation(&self) -> CommandSpec {
        let spec = CommandSpec::new(self.command.to_string_lossy()).streamed();
        if self.backup {
            spec.arg("--backup")
        } else {
            spec
        }
    }

    /// Run the sync command, then check every expected symlink.
    pub fn run(&self, runner: &dyn CommandRunner, probe: &dyn Probe) -> Result<(), SyncError> {
        if !probe.is_file(&self.command) {
            return Err(SyncError::Missing {
                path: self.command.clone(),
            });
        }
        checks::validate_executable(probe, &self.command)?;

        let spec = self.invocation();
        ui::info(&format!("Running {}", spec.display()));
        let outcome = runner.run(&spec);
        if !outcome.is_success() {
            return Err(SyncError::Failed {
                command: spec.display(),
                reason: outcome.describe(),
            });
        }

        self.verify(probe)
    }

    fn verify(&self, probe: &dyn Probe) -> Result<(), SyncError> {
        let failures: Vec<ValidationError> = self
            .verify_links
            .iter()
            .filter_map(|rel| checks::validate_symlink(probe, &probe.home_path(rel), None).err())
            .collect();

        for failure in &failures {
            ui::warn(&failure.to_string());
        }

        if failures.is_empty() {
            if !self.verify_links.is_empty() {
                log::info!("Verified {} symlink(s)", self.verify_links.len());
            }
            Ok(())
        } else {
            Err(SyncError::Links { failures })
        }
    }
}
