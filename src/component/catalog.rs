//! The static component catalog, in execution order.

use pkgkit::{CommandSpec, OsFamily, Repository};

use super::{Component, DOWNLOAD_TIMEOUT, InstallEnv, InstallError};
use crate::checks::{self, Check, ValidationError};
use crate::probe::Probe;

pub const BASE: &str = "base";

static CATALOG: &[Component] = &[
    Component {
        key: BASE,
        description: "Core build tools, git, curl and stow",
        check: Check::AllBinaries(&["git", "curl", "stow"]),
        install: install_base,
        validate: Some(validate_base),
        requires: &[],
        mandatory: true,
    },
    Component {
        key: "shell",
        description: "zsh with Zinit and the Starship prompt",
        check: Check::All(&[
            Check::Binary("zsh"),
            Check::Binary("starship"),
            Check::Directory(ZINIT_DIR),
        ]),
        install: install_shell,
        validate: Some(validate_shell),
        requires: &[BASE],
        mandatory: false,
    },
    Component {
        key: "cli-tools",
        description: "ripgrep, fd, bat, fzf, eza, jq and friends",
        check: Check::All(&[
            Check::Binary("rg"),
            Check::Binary("fzf"),
            Check::AnyBinary(&["bat", "batcat"]),
            Check::AnyBinary(&["fd", "fdfind"]),
        ]),
        install: install_cli_tools,
        validate: Some(validate_cli_tools),
        requires: &[BASE],
        mandatory: false,
    },
    Component {
        key: "git-config",
        description: "Global git defaults",
        check: Check::GitConfig("init.defaultBranch"),
        install: install_git_config,
        validate: Some(validate_git_config),
        requires: &[BASE],
        mandatory: false,
    },
    Component {
        key: "neovim",
        description: "Neovim editor",
        check: Check::Binary("nvim"),
        install: install_neovim,
        validate: Some(validate_neovim),
        requires: &[BASE],
        mandatory: false,
    },
    Component {
        key: "tmux",
        description: "tmux with the plugin manager (TPM)",
        check: Check::All(&[Check::Binary("tmux"), Check::Directory(TPM_DIR)]),
        install: install_tmux,
        validate: Some(validate_tmux),
        requires: &[BASE],
        mandatory: false,
    },
    Component {
        key: "nvm",
        description: "Node Version Manager",
        check: Check::File(NVM_SCRIPT),
        install: install_nvm,
        validate: Some(validate_nvm),
        requires: &[BASE],
        mandatory: false,
    },
    Component {
        key: "node",
        description: "Node.js LTS through nvm",
        check: Check::Any(&[Check::Binary("node"), Check::Directory(NODE_VERSIONS_DIR)]),
        install: install_node,
        validate: Some(validate_node),
        requires: &["nvm"],
        mandatory: false,
    },
];

/// Every component, in execution order.
pub fn all() -> &'static [Component] {
    CATALOG
}

pub fn find(key: &str) -> Option<&'static Component> {
    CATALOG.iter().find(|c| c.key == key)
}

/// Components a user may opt into.
pub fn optional() -> impl Iterator<Item = &'static Component> {
    CATALOG.iter().filter(|c| !c.mandatory)
}

pub fn mandatory() -> impl Iterator<Item = &'static Component> {
    CATALOG.iter().filter(|c| c.mandatory)
}

// ============================================================================
// base
// ============================================================================

const DEBIAN_BASE: &[&str] = &[
    "build-essential",
    "git",
    "curl",
    "wget",
    "unzip",
    "stow",
    "ca-certificates",
    "gnupg",
];

const RPM_BASE: &[&str] = &[
    "git",
    "curl",
    "wget",
    "unzip",
    "stow",
    "ca-certificates",
    "gnupg2",
];

fn install_base(env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
    match env.family() {
        OsFamily::Rpm => {
            env.install_group("development-tools")?;
            env.install_packages(RPM_BASE)?;
        }
        _ => {
            env.install_packages(DEBIAN_BASE)?;
        }
    }
    Ok(())
}

fn validate_base(probe: &dyn Probe) -> Result<(), ValidationError> {
    for command in ["git", "curl", "stow"] {
        checks::validate_command(probe, command)?;
    }
    Ok(())
}

// ============================================================================
// shell
// ============================================================================

const ZINIT_REPO: &str = "https://github.com/zdharma-continuum/zinit.git";
const ZINIT_DIR: &str = ".local/share/zinit/zinit.git";
const STARSHIP_INSTALLER: &str = "https://starship.rs/install.sh";

fn install_shell(env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
    env.install_packages(&["zsh"])?;
    env.clone_repo(ZINIT_REPO, ZINIT_DIR)?;

    if env.probe.has_binary("starship") {
        log::info!("starship already installed");
        return Ok(());
    }

    let bin_dir = env.home().join(".local/bin");
    std::fs::create_dir_all(&bin_dir)?;
    env.run_installer(
        STARSHIP_INSTALLER,
        CommandSpec::new("sh")
            .args(["--yes", "--bin-dir"])
            .arg(bin_dir.to_string_lossy()),
    )?;
    checks::validate_executable(env.probe, &bin_dir.join("starship"))?;
    Ok(())
}

fn validate_shell(probe: &dyn Probe) -> Result<(), ValidationError> {
    checks::validate_command(probe, "zsh")?;
    checks::validate_command(probe, "starship")?;
    checks::validate_directory(probe, &probe.home_path(ZINIT_DIR))
}

// ============================================================================
// cli-tools
// ============================================================================

const CLI_TOOLS: &[&str] = &["ripgrep", "fd-find", "bat", "fzf", "jq", "tree", "htop"];
const EZA_KEY_URL: &str = "https://raw.githubusercontent.com/eza-community/eza/main/deb.asc";
const EZA_KEYRING: &str = "gierens";
const EZA_SOURCE: &str =
    "deb [signed-by=/etc/apt/keyrings/gierens.gpg] http://deb.gierens.de stable main";

fn install_cli_tools(env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
    env.install_packages(CLI_TOOLS)?;

    if env.probe.has_binary("eza") {
        return Ok(());
    }

    if env.family() == OsFamily::Debian {
        env.add_signing_key(EZA_KEY_URL, EZA_KEYRING)?;
        env.add_repository(&Repository::AptSource {
            name: EZA_KEYRING.to_string(),
            line: EZA_SOURCE.to_string(),
        })?;
    }
    env.install_packages(&["eza"])?;
    Ok(())
}

fn validate_cli_tools(probe: &dyn Probe) -> Result<(), ValidationError> {
    checks::validate_command(probe, "rg")?;
    checks::validate_command(probe, "fzf")
}

// ============================================================================
// git-config
// ============================================================================

const GIT_DEFAULTS: &[(&str, &str)] = &[
    ("init.defaultBranch", "main"),
    ("pull.rebase", "true"),
    ("core.editor", "nvim"),
];

fn install_git_config(env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
    for &(key, value) in GIT_DEFAULTS {
        if let Some(current) = env.probe.git_config(key) {
            log::info!("git {key} already set to {current}");
            continue;
        }
        env.run(CommandSpec::new("git").args(["config", "--global", key, value]))?;
    }
    Ok(())
}

fn validate_git_config(probe: &dyn Probe) -> Result<(), ValidationError> {
    checks::validate_git_config(probe, "init.defaultBranch", None)
}

// ============================================================================
// neovim
// ============================================================================

const NEOVIM_PPA: &str = "ppa:neovim-ppa/unstable";

fn install_neovim(env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
    // Launchpad PPAs only serve Ubuntu releases
    if env.os.id == "ubuntu" {
        env.install_packages(&["software-properties-common"])?;
        env.add_repository(&Repository::Ppa(NEOVIM_PPA.to_string()))?;
    }
    env.install_packages(&["neovim"])?;
    Ok(())
}

fn validate_neovim(probe: &dyn Probe) -> Result<(), ValidationError> {
    checks::validate_command(probe, "nvim")
}

// ============================================================================
// tmux
// ============================================================================

const TPM_REPO: &str = "https://github.com/tmux-plugins/tpm";
const TPM_DIR: &str = ".tmux/plugins/tpm";

fn install_tmux(env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
    env.install_packages(&["tmux"])?;
    env.clone_repo(TPM_REPO, TPM_DIR)
}

fn validate_tmux(probe: &dyn Probe) -> Result<(), ValidationError> {
    checks::validate_command(probe, "tmux")?;
    checks::validate_directory(probe, &probe.home_path(TPM_DIR))
}

// ============================================================================
// nvm / node
// ============================================================================

const NVM_INSTALLER: &str = "https://raw.githubusercontent.com/nvm-sh/nvm/v0.40.1/install.sh";
const NVM_SCRIPT: &str = ".nvm/nvm.sh";
const NODE_VERSIONS_DIR: &str = ".nvm/versions/node";

fn install_nvm(env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
    // PROFILE=/dev/null keeps the installer away from shell rc files
    env.run_installer(
        NVM_INSTALLER,
        CommandSpec::new("bash").env("PROFILE", "/dev/null"),
    )
}

fn validate_nvm(probe: &dyn Probe) -> Result<(), ValidationError> {
    checks::validate_file(probe, &probe.home_path(NVM_SCRIPT))
}

fn install_node(env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
    if !checks::is_component_installed("nvm", env.probe) {
        return Err(InstallError::PrerequisiteMissing {
            component: "node",
            prerequisite: "nvm",
        });
    }

    let nvm_script = env.probe.home_path(NVM_SCRIPT);
    env.run(
        CommandSpec::new("bash")
            .arg("-c")
            .arg(format!(". {} && nvm install --lts", nvm_script.display()))
            .timeout(DOWNLOAD_TIMEOUT)
            .streamed(),
    )?;
    Ok(())
}

fn validate_node(probe: &dyn Probe) -> Result<(), ValidationError> {
    checks::validate_directory(probe, &probe.home_path(NODE_VERSIONS_DIR))
}
