//! Pre-flight checks, run in order before any component:
//! OS, then privileges, then disk space, then network.

use pkgkit::{OsIdentity, os};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::config::PreflightConfig;
use crate::probe::Probe;
use crate::{progress, ui};

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("unsupported operating system: {os} (supported: Debian/Ubuntu and Fedora/RHEL families)")]
    UnsupportedOs { os: String },

    #[error(
        "refusing to run as root; run as your normal user (sudo is requested when needed) or set preflight.allow_root"
    )]
    RunningAsRoot,

    #[error(
        "not enough free disk space in {}: {available_mb} MB available, {required_mb} MB required",
        path.display()
    )]
    InsufficientDisk {
        required_mb: u64,
        available_mb: u64,
        path: PathBuf,
    },

    #[error("could not determine free disk space for {}: {source}", path.display())]
    DiskQueryFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no network connectivity: {url} is unreachable")]
    NoNetwork { url: String },
}

pub fn check_os(identity: &OsIdentity) -> Result<(), PreflightError> {
    if os::is_supported(identity.family) {
        log::debug!("OS {} ({}) supported", identity.display_name(), identity.family);
        Ok(())
    } else {
        Err(PreflightError::UnsupportedOs {
            os: identity.display_name(),
        })
    }
}

pub fn check_privileges(probe: &dyn Probe, allow_root: bool) -> Result<(), PreflightError> {
    if !probe.is_root() {
        return Ok(());
    }
    if allow_root {
        log::warn!("Running as root (allowed by configuration)");
        Ok(())
    } else {
        Err(PreflightError::RunningAsRoot)
    }
}

pub fn check_disk(probe: &dyn Probe, path: &Path, required_mb: u64) -> Result<(), PreflightError> {
    let available_mb = probe
        .available_disk_mb(path)
        .map_err(|source| PreflightError::DiskQueryFailed {
            path: path.to_path_buf(),
            source,
        })?;

    log::debug!(
        "Disk: {available_mb} MB available in {}, {required_mb} MB required",
        path.display()
    );
    if available_mb < required_mb {
        return Err(PreflightError::InsufficientDisk {
            required_mb,
            available_mb,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

pub fn check_network(probe: &dyn Probe, url: &str, timeout: Duration) -> Result<(), PreflightError> {
    if probe.network_reachable(url, timeout) {
        Ok(())
    } else {
        Err(PreflightError::NoNetwork {
            url: url.to_string(),
        })
    }
}

/// Run every check in order, stopping at the first failure.
pub fn run_all(
    identity: &OsIdentity,
    probe: &dyn Probe,
    config: &PreflightConfig,
    required_mb: u64,
) -> Result<(), PreflightError> {
    check_os(identity)?;
    check_privileges(probe, config.allow_root)?;
    check_disk(probe, probe.home(), required_mb)?;

    if config.check_network {
        let pb = progress::spinner("Checking network connectivity...");
        let result = check_network(
            probe,
            &config.connectivity_url,
            Duration::from_secs(config.connectivity_timeout_secs),
        );
        match &result {
            Ok(()) => progress::finish_success(&pb, "Network reachable"),
            Err(e) => progress::finish_error(&pb, &e.to_string()),
        }
        result?;
    } else {
        log::debug!("Network check disabled");
    }

    ui::success(&format!(
        "Pre-flight checks passed ({} free required)",
        ui::format_mb(required_mb)
    ));
    Ok(())
}
