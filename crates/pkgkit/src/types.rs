//! Core types for package management.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A package reference passed to the package manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    /// Package name as known to the distribution (e.g., "fd-find")
    pub name: String,
    /// Optional version constraint
    pub version: Option<String>,
}

impl Package {
    /// Create a package reference without a version constraint.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Pin the package to a version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Build references for a list of names.
    pub fn many(names: &[&str]) -> Vec<Self> {
        names.iter().map(|n| Self::new(*n)).collect()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Result of [`crate::PackageManager::install_if_missing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The package was already present; nothing was run
    AlreadyInstalled,
    /// The package was installed by this call
    Installed,
}

/// A third-party package source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repository {
    /// Launchpad PPA, e.g. `ppa:neovim-ppa/unstable` (apt only)
    Ppa(String),
    /// A `deb` line written to `/etc/apt/sources.list.d/<name>.list` (apt only)
    AptSource {
        /// File stem under `sources.list.d`
        name: String,
        /// Full `deb [...] uri suite component` line
        line: String,
    },
    /// A `.repo` URL added through `dnf config-manager` (dnf only)
    RpmRepo {
        /// URL of the `.repo` file
        url: String,
    },
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repository::Ppa(spec) => write!(f, "{spec}"),
            Repository::AptSource { name, .. } => write!(f, "apt source '{name}'"),
            Repository::RpmRepo { url } => write!(f, "{url}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_display() {
        assert_eq!(Package::new("git").to_string(), "git");
        assert_eq!(
            Package::new("neovim").with_version("0.10.0").to_string(),
            "neovim@0.10.0"
        );
    }

    #[test]
    fn test_package_many() {
        let pkgs = Package::many(&["git", "curl"]);
        assert_eq!(pkgs.len(), 2);
        assert_eq!(pkgs[1].name, "curl");
        assert!(pkgs[1].version.is_none());
    }
}
