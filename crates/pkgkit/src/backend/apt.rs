//! apt backend for Debian-like distributions.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::exec::{CommandSpec, ExecOutcome};
use crate::os::OsFamily;
use crate::types::{Package, Repository};
use std::time::Duration;

const KEYRING_DIR: &str = "/etc/apt/keyrings";
const SOURCES_DIR: &str = "/etc/apt/sources.list.d";
const KEY_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Backend that speaks `apt-get` / `dpkg-query`.
#[derive(Debug, Clone, Default)]
pub struct AptBackend;

impl AptBackend {
    /// Create a new apt backend.
    pub fn new() -> Self {
        Self
    }

    fn apt_get(&self) -> CommandSpec {
        CommandSpec::new("apt-get")
            .env("DEBIAN_FRONTEND", "noninteractive")
            .privileged()
            .streamed()
    }
}

/// apt pins versions as `name=version`.
fn render(package: &Package) -> String {
    match &package.version {
        Some(v) => format!("{}={}", package.name, v),
        None => package.name.clone(),
    }
}

impl Backend for AptBackend {
    fn name(&self) -> &'static str {
        "apt"
    }

    fn family(&self) -> OsFamily {
        OsFamily::Debian
    }

    fn refresh_command(&self) -> CommandSpec {
        self.apt_get().arg("update")
    }

    fn install_command(&self, packages: &[Package]) -> CommandSpec {
        self.apt_get()
            .args(["install", "-y", "--no-install-recommends"])
            .args(packages.iter().map(render))
    }

    fn remove_command(&self, packages: &[Package]) -> CommandSpec {
        self.apt_get()
            .args(["remove", "-y"])
            .args(packages.iter().map(|p| p.name.clone()))
    }

    fn query_command(&self, name: &str) -> CommandSpec {
        CommandSpec::new("dpkg-query").args(["-W", "-f=${Status}", name])
    }

    fn query_matches(&self, outcome: &ExecOutcome) -> bool {
        // dpkg-query succeeds for removed-but-configured packages too
        outcome
            .stdout()
            .is_some_and(|s| s.contains("install ok installed"))
    }

    fn repository_commands(&self, repository: &Repository) -> Result<Vec<CommandSpec>> {
        match repository {
            Repository::Ppa(spec) => Ok(vec![
                CommandSpec::new("add-apt-repository")
                    .args(["-y", "--no-update", spec.as_str()])
                    .privileged(),
            ]),
            Repository::AptSource { name, line } => Ok(vec![
                CommandSpec::new("tee")
                    .arg(format!("{SOURCES_DIR}/{name}.list"))
                    .stdin(format!("{line}\n"))
                    .privileged(),
            ]),
            Repository::RpmRepo { .. } => Err(Error::Unsupported {
                operation: "add_repository(rpm)",
                manager: self.name(),
            }),
        }
    }

    fn signing_key_commands(&self, url: &str, keyring: &str) -> Vec<CommandSpec> {
        let download = std::env::temp_dir().join(format!("{keyring}.asc"));
        let download = download.to_string_lossy().into_owned();
        vec![
            CommandSpec::new("install")
                .args(["-d", "-m", "0755", KEYRING_DIR])
                .privileged(),
            CommandSpec::new("curl")
                .args(["-fsSL", "-o", download.as_str(), url])
                .timeout(KEY_DOWNLOAD_TIMEOUT),
            CommandSpec::new("gpg")
                .args(["--dearmor", "--yes", "-o"])
                .arg(format!("{KEYRING_DIR}/{keyring}.gpg"))
                .arg(download)
                .privileged(),
        ]
    }
}
