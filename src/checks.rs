//! Idempotency checks and post-install validators.
//!
//! A [`Check`] answers "is this component already in place?" before its
//! install action runs. The `validate_*` functions run after an install
//! action and turn a missing artefact into a [`ValidationError`].

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::component::{Component, catalog};
use crate::probe::Probe;

/// A named, side-effect-free check. Relative paths resolve against `$HOME`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Binary resolves on PATH
    Binary(&'static str),
    /// At least one of the binaries resolves (distro renames like `batcat`)
    AnyBinary(&'static [&'static str]),
    /// Every binary resolves
    AllBinaries(&'static [&'static str]),
    Directory(&'static str),
    File(&'static str),
    /// Global git config key is set to anything
    GitConfig(&'static str),
    All(&'static [Check]),
    Any(&'static [Check]),
}

impl Check {
    /// Evaluate against the probe.
    pub fn evaluate(&self, probe: &dyn Probe) -> bool {
        match self {
            Self::Binary(name) => probe.has_binary(name),
            Self::AnyBinary(names) => names.iter().any(|n| probe.has_binary(n)),
            Self::AllBinaries(names) => names.iter().all(|n| probe.has_binary(n)),
            Self::Directory(rel) => probe.is_dir(&probe.home_path(rel)),
            Self::File(rel) => probe.is_file(&probe.home_path(rel)),
            Self::GitConfig(key) => probe.git_config(key).is_some(),
            Self::All(checks) => checks.iter().all(|c| c.evaluate(probe)),
            Self::Any(checks) => checks.iter().any(|c| c.evaluate(probe)),
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, checks: &[Check], sep: &str) -> fmt::Result {
            for (i, check) in checks.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{check}")?;
            }
            Ok(())
        }

        match self {
            Self::Binary(name) => write!(f, "{name}"),
            Self::AnyBinary(names) => write!(f, "{}", names.join("|")),
            Self::AllBinaries(names) => write!(f, "{}", names.join(" + ")),
            Self::Directory(rel) => write!(f, "~/{rel}/"),
            Self::File(rel) => write!(f, "~/{rel}"),
            Self::GitConfig(key) => write!(f, "git {key}"),
            Self::All(checks) => join(f, checks, " + "),
            Self::Any(checks) => join(f, checks, " | "),
        }
    }
}

/// Whether the catalog component `key` is already installed.
///
/// Unknown keys are reported as not installed.
pub fn is_component_installed(key: &str, probe: &dyn Probe) -> bool {
    catalog::find(key).is_some_and(|c| c.check.evaluate(probe))
}

/// Log and return true when `component` is already installed.
pub fn skip_if_installed(component: &Component, probe: &dyn Probe) -> bool {
    if component.check.evaluate(probe) {
        log::info!("{} already installed, skipping", component.key);
        true
    } else {
        false
    }
}

// ============================================================================
// Validators
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("command '{command}' not found on PATH")]
    CommandMissing { command: String },

    #[error("file not found: {}", path.display())]
    FileMissing { path: PathBuf },

    #[error("directory not found: {}", path.display())]
    DirectoryMissing { path: PathBuf },

    #[error("not a symlink: {}", path.display())]
    NotSymlink { path: PathBuf },

    #[error("{} points to {}, expected {}", path.display(), actual.display(), expected.display())]
    WrongSymlinkTarget {
        path: PathBuf,
        expected: PathBuf,
        actual: PathBuf,
    },

    #[error("git config {key} is not set")]
    GitConfigUnset { key: String },

    #[error("git config {key} is '{actual}', expected '{expected}'")]
    GitConfigMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("not executable: {}", path.display())]
    NotExecutable { path: PathBuf },
}

pub fn validate_command(probe: &dyn Probe, command: &str) -> Result<(), ValidationError> {
    if probe.has_binary(command) {
        log::debug!("✓ {command} available");
        Ok(())
    } else {
        Err(ValidationError::CommandMissing {
            command: command.to_string(),
        })
    }
}

pub fn validate_file(probe: &dyn Probe, path: &Path) -> Result<(), ValidationError> {
    if probe.is_file(path) {
        log::debug!("✓ {} exists", path.display());
        Ok(())
    } else {
        Err(ValidationError::FileMissing {
            path: path.to_path_buf(),
        })
    }
}

pub fn validate_directory(probe: &dyn Probe, path: &Path) -> Result<(), ValidationError> {
    if probe.is_dir(path) {
        log::debug!("✓ {} exists", path.display());
        Ok(())
    } else {
        Err(ValidationError::DirectoryMissing {
            path: path.to_path_buf(),
        })
    }
}

/// Check that `path` is a symlink, optionally pointing at `expected`.
pub fn validate_symlink(
    probe: &dyn Probe,
    path: &Path,
    expected: Option<&Path>,
) -> Result<(), ValidationError> {
    if !probe.is_symlink(path) {
        return Err(ValidationError::NotSymlink {
            path: path.to_path_buf(),
        });
    }

    if let Some(expected) = expected {
        let actual = probe.read_link(path).unwrap_or_default();
        if actual != expected {
            return Err(ValidationError::WrongSymlinkTarget {
                path: path.to_path_buf(),
                expected: expected.to_path_buf(),
                actual,
            });
        }
    }

    log::debug!("✓ {} is a symlink", path.display());
    Ok(())
}

/// Check that a global git config key is set, optionally to `expected`.
pub fn validate_git_config(
    probe: &dyn Probe,
    key: &str,
    expected: Option<&str>,
) -> Result<(), ValidationError> {
    let Some(actual) = probe.git_config(key) else {
        return Err(ValidationError::GitConfigUnset {
            key: key.to_string(),
        });
    };

    if let Some(expected) = expected
        && actual != expected
    {
        return Err(ValidationError::GitConfigMismatch {
            key: key.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }

    log::debug!("✓ git {key} = {actual}");
    Ok(())
}

pub fn validate_executable(probe: &dyn Probe, path: &Path) -> Result<(), ValidationError> {
    if probe.is_executable(path) {
        log::debug!("✓ {} is executable", path.display());
        Ok(())
    } else {
        Err(ValidationError::NotExecutable {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FakeProbe;

    #[test]
    fn test_binary_checks() {
        let probe = FakeProbe::new().with_binaries(&["rg", "batcat"]);

        assert!(Check::Binary("rg").evaluate(&probe));
        assert!(!Check::Binary("bat").evaluate(&probe));
        assert!(Check::AnyBinary(&["bat", "batcat"]).evaluate(&probe));
        assert!(!Check::AllBinaries(&["rg", "fzf"]).evaluate(&probe));
    }

    #[test]
    fn test_path_checks_resolve_in_home() {
        let probe = FakeProbe::new();
        probe.mkdir(".tmux/plugins/tpm");
        probe.touch(".nvm/nvm.sh");

        assert!(Check::Directory(".tmux/plugins/tpm").evaluate(&probe));
        assert!(Check::File(".nvm/nvm.sh").evaluate(&probe));
        assert!(!Check::File(".tmux/plugins/tpm").evaluate(&probe));
        assert!(!Check::Directory(".local/share/zinit/zinit.git").evaluate(&probe));
    }

    #[test]
    fn test_composite_checks() {
        const CHECK: Check = Check::Any(&[
            Check::Binary("node"),
            Check::All(&[Check::Binary("git"), Check::GitConfig("user.name")]),
        ]);

        let probe = FakeProbe::new().with_binaries(&["git"]);
        assert!(!CHECK.evaluate(&probe));
        probe.set_git("user.name", "someone");
        assert!(CHECK.evaluate(&probe));
        assert_eq!(CHECK.to_string(), "node | git + git user.name");
    }

    #[test]
    fn test_unknown_component_is_not_installed() {
        let probe = FakeProbe::new();
        assert!(!is_component_installed("does-not-exist", &probe));
    }

    #[test]
    fn test_catalog_lookup() {
        let probe = FakeProbe::new();
        assert!(!is_component_installed("nvm", &probe));
        probe.touch(".nvm/nvm.sh");
        assert!(is_component_installed("nvm", &probe));
    }

    #[test]
    fn test_skip_if_installed_uses_component_check() {
        let neovim = catalog::find("neovim").unwrap();
        let probe = FakeProbe::new();
        assert!(!skip_if_installed(neovim, &probe));
        probe.add_binary("nvim");
        assert!(skip_if_installed(neovim, &probe));
    }

    #[test]
    fn test_validate_command() {
        let probe = FakeProbe::new().with_binaries(&["zsh"]);
        assert!(validate_command(&probe, "zsh").is_ok());
        assert_eq!(
            validate_command(&probe, "starship").unwrap_err().to_string(),
            "command 'starship' not found on PATH"
        );
    }

    #[test]
    fn test_validate_file_and_directory() {
        let probe = FakeProbe::new();
        let file = probe.touch(".zshrc");
        let dir = probe.mkdir(".config");

        assert!(validate_file(&probe, &file).is_ok());
        assert!(validate_directory(&probe, &dir).is_ok());
        assert!(matches!(
            validate_file(&probe, &dir),
            Err(ValidationError::FileMissing { .. })
        ));
        assert!(matches!(
            validate_directory(&probe, &file),
            Err(ValidationError::DirectoryMissing { .. })
        ));
    }

    #[test]
    fn test_validate_symlink() {
        let probe = FakeProbe::new();
        let target = probe.touch(".dotfiles/zsh/.zshrc");
        let other = probe.touch(".dotfiles/other");
        let link = probe.home().join(".zshrc");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(validate_symlink(&probe, &link, None).is_ok());
        assert!(validate_symlink(&probe, &link, Some(&target)).is_ok());
        assert!(matches!(
            validate_symlink(&probe, &link, Some(&other)),
            Err(ValidationError::WrongSymlinkTarget { .. })
        ));
        assert!(matches!(
            validate_symlink(&probe, &target, None),
            Err(ValidationError::NotSymlink { .. })
        ));
    }

    #[test]
    fn test_validate_git_config() {
        let probe = FakeProbe::new();
        assert!(matches!(
            validate_git_config(&probe, "pull.rebase", None),
            Err(ValidationError::GitConfigUnset { .. })
        ));

        probe.set_git("pull.rebase", "false");
        assert!(validate_git_config(&probe, "pull.rebase", None).is_ok());
        assert_eq!(
            validate_git_config(&probe, "pull.rebase", Some("true"))
                .unwrap_err()
                .to_string(),
            "git config pull.rebase is 'false', expected 'true'"
        );
    }

    #[test]
    fn test_validate_executable() {
        use std::os::unix::fs::PermissionsExt;

        let probe = FakeProbe::new();
        let script = probe.touch(".local/bin/tool");
        assert!(validate_executable(&probe, &script).is_err());

        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(validate_executable(&probe, &script).is_ok());
    }
}
