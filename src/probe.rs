//! Read-only queries against the machine.
//!
//! Checks, validators and pre-flight all go through [`Probe`] so they can be
//! exercised against a fake home directory in tests.

use pkgkit::{CommandRunner, CommandSpec};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Side-effect-free environment queries.
pub trait Probe {
    /// The user's home directory; relative check paths resolve against it.
    fn home(&self) -> &Path;

    /// Whether `name` resolves to an executable on `PATH` or in `~/.local/bin`.
    fn has_binary(&self, name: &str) -> bool;

    /// Global git config value, `None` when unset.
    fn git_config(&self, key: &str) -> Option<String>;

    /// Whether the process runs with an effective uid of 0.
    fn is_root(&self) -> bool;

    /// Free space available to unprivileged users on the filesystem of `path`.
    fn available_disk_mb(&self, path: &Path) -> io::Result<u64>;

    /// Whether `url` answers at all within `timeout`.
    fn network_reachable(&self, url: &str, timeout: Duration) -> bool;

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        path.symlink_metadata()
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn read_link(&self, path: &Path) -> Option<PathBuf> {
        std::fs::read_link(path).ok()
    }

    fn is_executable(&self, path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    /// Resolve `rel` against the home directory (absolute paths pass through).
    fn home_path(&self, rel: &str) -> PathBuf {
        self.home().join(rel)
    }
}

/// Probe backed by the real system.
pub struct SystemProbe {
    home: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl SystemProbe {
    pub fn new(home: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        Self { home, runner }
    }
}

impl Probe for SystemProbe {
    fn home(&self) -> &Path {
        &self.home
    }

    fn has_binary(&self, name: &str) -> bool {
        which::which(name).is_ok() || self.is_executable(&self.home.join(".local/bin").join(name))
    }

    fn git_config(&self, key: &str) -> Option<String> {
        let outcome = self
            .runner
            .run(&CommandSpec::new("git").args(["config", "--global", "--get", key]));
        outcome
            .stdout()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn is_root(&self) -> bool {
        pkgkit::exec::is_root()
    }

    #[cfg(unix)]
    fn available_disk_mb(&self, path: &Path) -> io::Result<u64> {
        use std::ffi::CString;
        use std::mem::MaybeUninit;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        // SAFETY: c_path is a valid NUL-terminated string and stat is only
        // read after statvfs reports success.
        unsafe {
            let mut stat: MaybeUninit<libc::statvfs> = MaybeUninit::uninit();
            if libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) != 0 {
                return Err(io::Error::last_os_error());
            }
            let stat = stat.assume_init();
            #[allow(clippy::useless_conversion)]
            let bytes = u64::from(stat.f_bavail) * u64::from(stat.f_frsize);
            Ok(bytes / (1024 * 1024))
        }
    }

    #[cfg(not(unix))]
    fn available_disk_mb(&self, _path: &Path) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "disk space detection not supported on this platform",
        ))
    }

    fn network_reachable(&self, url: &str, timeout: Duration) -> bool {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        match agent.head(url).header("User-Agent", "dotstrap").call() {
            // Any HTTP answer means the host is reachable
            Ok(_) | Err(ureq::Error::StatusCode(_)) => true,
            Err(e) => {
                log::debug!("Connectivity check against {url} failed: {e}");
                false
            }
        }
    }
}

// ============================================================================
// Test double
// ============================================================================

#[cfg(test)]
pub use fake::FakeProbe;


#[cfg(test)]
mod tests {
    use super::*;
    use pkgkit::ExecOutcome;
    use pkgkit::testing::RecordingRunner;

    fn system_probe(runner: Arc<RecordingRunner>) -> (tempfile::TempDir, SystemProbe) {
        let home = tempfile::tempdir().unwrap();
        let probe = SystemProbe::new(home.path().to_path_buf(), runner);
        (home, probe)
    }

    #[test]
    fn test_git_config_trims_value() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond("init.defaultBranch", ExecOutcome::ok("main\n"));
        let (_home, probe) = system_probe(runner.clone());

        assert_eq!(probe.git_config("init.defaultBranch").as_deref(), Some("main"));
        assert_eq!(
            runner.lines(),
            vec!["git config --global --get init.defaultBranch"]
        );
    }

    #[test]
    fn test_git_config_unset() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond("git config", ExecOutcome::failed(1, ""));
        let (_home, probe) = system_probe(runner);

        assert_eq!(probe.git_config("pull.rebase"), None);
    }

    #[test]
    fn test_has_binary_checks_local_bin() {
        use std::os::unix::fs::PermissionsExt;

        let runner = Arc::new(RecordingRunner::new());
        let (home, probe) = system_probe(runner);
        let bin = home.path().join(".local/bin");
        std::fs::create_dir_all(&bin).unwrap();
        let tool = bin.join("dotstrap-test-tool-xyz");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();

        assert!(!probe.has_binary("dotstrap-test-tool-xyz"));
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(probe.has_binary("dotstrap-test-tool-xyz"));
    }

    #[test]
    fn test_has_binary_on_path() {
        let runner = Arc::new(RecordingRunner::new());
        let (_home, probe) = system_probe(runner);
        assert!(probe.has_binary("sh"));
        assert!(!probe.has_binary("definitely-not-a-real-program-xyz"));
    }

    #[test]
    fn test_available_disk_mb() {
        let runner = Arc::new(RecordingRunner::new());
        let (home, probe) = system_probe(runner);
        assert!(probe.available_disk_mb(home.path()).is_ok());
        assert!(probe.available_disk_mb(Path::new("/no/such/dir/xyz")).is_err());
    }

    #[test]
    fn test_symlink_queries() {
        let runner = Arc::new(RecordingRunner::new());
        let (home, probe) = system_probe(runner);
        let target = home.path().join("target");
        std::fs::write(&target, "x").unwrap();
        let link = home.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(probe.is_symlink(&link));
        assert!(!probe.is_symlink(&target));
        assert_eq!(probe.read_link(&link), Some(target));
    }

    #[test]
    fn test_fake_gains_binaries_after_install() {
        use pkgkit::CommandRunner;

        let runner = RecordingRunner::new();
        let probe = FakeProbe::new();
        probe.provides(&runner, "install -y tmux", &["tmux"]);
        assert!(!probe.has_binary("tmux"));

        runner.run(&CommandSpec::new("dnf").args(["install", "-y", "tmux"]));
        assert!(probe.has_binary("tmux"));
        assert!(probe.is_executable(&probe.home_path(".local/bin/tmux")));
    }
}
