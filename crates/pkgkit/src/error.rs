//! Error types for package-manager operations.
//!
//! Every failure names the operation and the package set involved, and
//! carries an [`ErrorCategory`] derived from the command outcome so callers
//! can give actionable feedback. Nothing here is retried.

use crate::exec::ExecOutcome;
use thiserror::Error;

/// Categories of package-manager failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Mirrors or download hosts unreachable
    Network,
    /// Package or repository does not exist
    NotFound,
    /// Permission denied or sudo refused
    Permission,
    /// Another process holds the package database lock
    Locked,
    /// The command exceeded its timeout
    Timeout,
    /// The package tool itself is missing
    ToolMissing,
    /// Anything else
    Other,
}

impl ErrorCategory {
    /// Categorize a failed command outcome.
    pub fn from_outcome(outcome: &ExecOutcome) -> Self {
        match outcome {
            ExecOutcome::Success { .. } => Self::Other,
            ExecOutcome::NetworkError { .. } => Self::Network,
            ExecOutcome::TimedOut { .. } => Self::Timeout,
            ExecOutcome::NotFound { .. } => Self::ToolMissing,
            ExecOutcome::SpawnFailed { .. } => Self::Other,
            ExecOutcome::NonZeroExit { stderr, .. } => Self::from_stderr(stderr),
        }
    }

    /// Categorize from a package tool's stderr.
    pub fn from_stderr(stderr: &str) -> Self {
        let lower = stderr.to_lowercase();

        if lower.contains("could not get lock")
            || lower.contains("unable to acquire the dpkg frontend lock")
            || lower.contains("waiting for process with pid")
        {
            return Self::Locked;
        }

        if lower.contains("unable to locate package")
            || lower.contains("has no installation candidate")
            || lower.contains("no match for argument")
            || lower.contains("unable to find a match")
            || lower.contains("no package")
        {
            return Self::NotFound;
        }

        if lower.contains("permission denied")
            || lower.contains("are you root")
            || lower.contains("a password is required")
            || lower.contains("operation not permitted")
        {
            return Self::Permission;
        }

        if lower.contains("failed to fetch")
            || lower.contains("temporary failure resolving")
            || lower.contains("cannot download")
            || lower.contains("curl error")
        {
            return Self::Network;
        }

        Self::Other
    }

    /// Get a user-friendly description of this category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Package not found",
            Self::Permission => "Permission denied",
            Self::Locked => "Package database locked",
            Self::Timeout => "Command timed out",
            Self::ToolMissing => "Package tool missing",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and mirrors, then re-run",
            Self::NotFound => "Verify the package name for this distribution or add its repository",
            Self::Permission => "Make sure your user can run sudo",
            Self::Locked => "Wait for the other package manager process (e.g. unattended-upgrades) to finish",
            Self::Timeout => "Re-run once the system is less busy",
            Self::ToolMissing => "Install the distribution's package tool or run on a supported system",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during package-manager operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No adapter exists for this distribution family
    #[error("unsupported distribution family: {family}")]
    UnsupportedFamily {
        /// Normalized family identifier
        family: String,
    },

    /// The operation does not exist for this package manager
    #[error("{operation} is not supported by {manager}")]
    Unsupported {
        /// Operation name
        operation: &'static str,
        /// Package manager name
        manager: &'static str,
    },

    /// Package metadata refresh failed
    #[error("{manager} metadata refresh failed: {reason}")]
    RefreshFailed {
        /// Package manager name
        manager: &'static str,
        /// Failure reason
        reason: String,
        /// Failure category
        category: ErrorCategory,
    },

    /// A batched install failed
    #[error("{manager} failed to install [{}]: {reason}", packages.join(", "))]
    InstallFailed {
        /// Package manager name
        manager: &'static str,
        /// The whole batch
        packages: Vec<String>,
        /// Failure reason
        reason: String,
        /// Failure category
        category: ErrorCategory,
    },

    /// A batched removal failed
    #[error("{manager} failed to remove [{}]: {reason}", packages.join(", "))]
    RemoveFailed {
        /// Package manager name
        manager: &'static str,
        /// The whole batch
        packages: Vec<String>,
        /// Failure reason
        reason: String,
        /// Failure category
        category: ErrorCategory,
    },

    /// Adding a package source failed
    #[error("failed to add repository {repository}: {reason}")]
    RepositoryFailed {
        /// Repository description
        repository: String,
        /// Failure reason
        reason: String,
    },

    /// Importing a signing key failed
    #[error("failed to add signing key {url}: {reason}")]
    SigningKeyFailed {
        /// Key URL
        url: String,
        /// Failure reason
        reason: String,
    },

    /// Installing a package group failed
    #[error("failed to install group '{group}': {reason}")]
    GroupFailed {
        /// Group name
        group: String,
        /// Failure reason
        reason: String,
    },
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::RefreshFailed { category, .. }
            | Error::InstallFailed { category, .. }
            | Error::RemoveFailed { category, .. } => *category,
            Error::UnsupportedFamily { .. } | Error::Unsupported { .. } => ErrorCategory::Other,
            Error::RepositoryFailed { reason, .. }
            | Error::SigningKeyFailed { reason, .. }
            | Error::GroupFailed { reason, .. } => ErrorCategory::from_stderr(reason),
        }
    }

    /// Whether the failure is a missing capability rather than a failed command.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported { .. } | Error::UnsupportedFamily { .. })
    }
}

/// Result type for package-manager operations.
pub type Result<T> = std::result::Result<T, Error>;
