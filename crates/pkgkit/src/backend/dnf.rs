//! dnf backend for RPM-like distributions.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::exec::CommandSpec;
use crate::os::OsFamily;
use crate::types::{Package, Repository};

/// Backend that speaks `dnf` / `rpm`.
#[derive(Debug, Clone, Default)]
pub struct DnfBackend;

impl DnfBackend {
    /// Create a new dnf backend.
    pub fn new() -> Self {
        Self
    }

    fn dnf(&self) -> CommandSpec {
        CommandSpec::new("dnf").privileged().streamed()
    }
}

/// dnf accepts `name-version` NEVRA prefixes.
fn render(package: &Package) -> String {
    match &package.version {
        Some(v) => format!("{}-{}", package.name, v),
        None => package.name.clone(),
    }
}

impl Backend for DnfBackend {
    fn name(&self) -> &'static str {
        "dnf"
    }

    fn family(&self) -> OsFamily {
        OsFamily::Rpm
    }

    fn refresh_command(&self) -> CommandSpec {
        self.dnf().arg("makecache")
    }

    fn install_command(&self, packages: &[Package]) -> CommandSpec {
        self.dnf()
            .args(["install", "-y"])
            .args(packages.iter().map(render))
    }

    fn remove_command(&self, packages: &[Package]) -> CommandSpec {
        self.dnf()
            .args(["remove", "-y"])
            .args(packages.iter().map(|p| p.name.clone()))
    }

    fn query_command(&self, name: &str) -> CommandSpec {
        CommandSpec::new("rpm").args(["-q", name])
    }

    fn repository_commands(&self, repository: &Repository) -> Result<Vec<CommandSpec>> {
        match repository {
            Repository::RpmRepo { url } => Ok(vec![
                CommandSpec::new("dnf")
                    .args(["config-manager", "--add-repo", url.as_str()])
                    .privileged(),
            ]),
            Repository::Ppa(_) | Repository::AptSource { .. } => Err(Error::Unsupported {
                operation: "add_repository(apt)",
                manager: self.name(),
            }),
        }
    }

    fn signing_key_commands(&self, url: &str, _keyring: &str) -> Vec<CommandSpec> {
        vec![CommandSpec::new("rpm").args(["--import", url]).privileged()]
    }

    fn group_command(&self, group: &str) -> Result<CommandSpec> {
        Ok(self.dnf().args(["group", "install", "-y", group]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_command_renders_versions() {
        let cmd = DnfBackend::new().install_command(&[
            Package::new("git"),
            Package::new("neovim").with_version("0.10.0"),
        ]);
        assert_eq!(cmd.display(), "dnf install -y git neovim-0.10.0");
        assert!(cmd.privileged);
    }

    #[test]
    fn test_ppa_unsupported() {
        let err = DnfBackend::new()
            .repository_commands(&Repository::Ppa("ppa:x/y".into()))
            .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_rpm_repo_uses_config_manager() {
        let cmds = DnfBackend::new()
            .repository_commands(&Repository::RpmRepo {
                url: "https://download.docker.com/linux/fedora/docker-ce.repo".into(),
            })
            .unwrap();
        assert_eq!(
            cmds[0].display(),
            "dnf config-manager --add-repo https://download.docker.com/linux/fedora/docker-ce.repo"
        );
    }

    #[test]
    fn test_group_command() {
        let cmd = DnfBackend::new().group_command("development-tools").unwrap();
        assert_eq!(cmd.display(), "dnf group install -y development-tools");
    }
}
