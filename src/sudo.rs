//! Sudo credential keep-alive
//!
//! Package installs span many minutes. Sudo is validated once up front,
//! then a background thread refreshes the timestamp until the guard is
//! dropped:
//! 1. `sudo -v` prompts for the password (once)
//! 2. `sudo -n -v` runs every interval without prompting
//! 3. Dropping the guard signals the thread and joins it

use anyhow::{Result, bail};
use pkgkit::{CommandRunner, CommandSpec};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Scoped keep-alive - stops refreshing on drop
pub struct SudoKeepalive {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SudoKeepalive {
    /// Validate sudo with a reason shown to the user, then keep it fresh.
    ///
    /// Returns `None` when already running as root.
    pub fn acquire(runner: Arc<dyn CommandRunner>, reason: &str) -> Result<Option<Self>> {
        if pkgkit::exec::is_root() {
            log::debug!("Running as root, no sudo keep-alive needed");
            return Ok(None);
        }
        Self::acquire_with(runner, reason, REFRESH_INTERVAL).map(Some)
    }

    fn acquire_with(
        runner: Arc<dyn CommandRunner>,
        reason: &str,
        interval: Duration,
    ) -> Result<Self> {
        eprintln!();
        eprintln!("  Sudo required: {reason}");
        eprintln!();

        let outcome = runner.run(&CommandSpec::new("sudo").arg("-v").streamed());
        if !outcome.is_success() {
            bail!("Failed to acquire sudo privileges: {}", outcome.describe());
        }

        Ok(Self::spawn(runner, interval))
    }

    fn spawn(runner: Arc<dyn CommandRunner>, interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("sudo-keepalive".to_string())
            .spawn(move || {
                loop {
                    match rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let outcome = runner.run(&CommandSpec::new("sudo").args(["-n", "-v"]));
                            if !outcome.is_success() {
                                log::warn!(
                                    "Could not refresh sudo credentials: {}",
                                    outcome.describe()
                                );
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::debug!("sudo keep-alive stopped");
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Could not start sudo keep-alive: {e}");
                None
            }
        };

        Self {
            stop: Some(tx),
            handle,
        }
    }
}

impl Drop for SudoKeepalive {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
