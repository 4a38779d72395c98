//! Configuration file handling.
//!
//! The config file is optional. It is looked up as `config.toml` or
//! `config.json` in [`paths::config_dir`], or taken from `--config`.

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::profile::ProfileKind;

/// On-disk config format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => bail!(
                "Unsupported config format: {} (expected .toml or .json)",
                path.display()
            ),
        }
    }
}

/// Load `<dir>/<name>.toml` or `<dir>/<name>.json`, whichever exists first.
pub fn load_config<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<(T, ConfigFormat)> {
    for ext in ["toml", "json"] {
        let path = dir.join(format!("{name}.{ext}"));
        if path.exists() {
            let (config, format) = load_from(&path)?;
            return Ok((config, format));
        }
    }
    bail!("No {name}.toml or {name}.json in {}", dir.display())
}

/// Load a config file from an explicit path.
pub fn load_from<T: DeserializeOwned>(path: &Path) -> Result<(T, ConfigFormat)> {
    let format = ConfigFormat::from_path(path)?;
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;

    let config = match format {
        ConfigFormat::Toml => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        ConfigFormat::Json => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
    };
    Ok((config, format))
}

// ============================================================================
// dotstrap config
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the dotfiles repository lives
    pub dotfiles_dir: String,
    pub sync: SyncConfig,
    pub preflight: PreflightConfig,
    pub disk: DiskConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dotfiles_dir: "~/.dotfiles".to_string(),
            sync: SyncConfig::default(),
            preflight: PreflightConfig::default(),
            disk: DiskConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Run the sync step after a successful install
    pub enabled: bool,
    /// Sync command; defaults to `<dotfiles_dir>/sync.sh`
    pub command: Option<String>,
    /// Ask the sync step to back up existing files first
    pub backup: bool,
    /// Paths (relative to `$HOME`) that must be symlinks after sync
    pub verify_links: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
            backup: true,
            verify_links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    /// Permit running as root (containers)
    pub allow_root: bool,
    pub check_network: bool,
    pub connectivity_url: String,
    pub connectivity_timeout_secs: u64,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            allow_root: false,
            check_network: true,
            connectivity_url: "https://github.com".to_string(),
            connectivity_timeout_secs: 10,
        }
    }
}

/// Minimum free disk space per profile, in MB
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    pub quick_mb: u64,
    pub full_mb: u64,
    pub custom_mb: u64,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            quick_mb: 1000,
            full_mb: 2000,
            custom_mb: 1000,
        }
    }
}

impl DiskConfig {
    pub fn required_mb(&self, kind: ProfileKind) -> u64 {
        match kind {
            ProfileKind::Quick => self.quick_mb,
            ProfileKind::Full => self.full_mb,
            ProfileKind::Custom => self.custom_mb,
        }
    }
}

impl Config {
    /// Load from an explicit path, or the default location, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config: Self = if let Some(path) = explicit {
            load_from(path)?.0
        } else {
            let dir = paths::config_dir()?;
            if dir.join("config.toml").exists() || dir.join("config.json").exists() {
                load_config(&dir, "config")?.0
            } else {
                log::debug!("No config file in {}, using defaults", dir.display());
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Semantic checks that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.dotfiles_dir.trim().is_empty() {
            bail!("dotfiles_dir must not be empty");
        }
        if self.preflight.check_network && self.preflight.connectivity_url.trim().is_empty() {
            bail!("preflight.connectivity_url must be set when check_network is enabled");
        }
        if self.preflight.connectivity_timeout_secs == 0 {
            bail!("preflight.connectivity_timeout_secs must be greater than zero");
        }
        if let Some(command) = &self.sync.command
            && command.trim().is_empty()
        {
            bail!("sync.command must not be empty when set");
        }
        for link in &self.sync.verify_links {
            if Path::new(link).is_absolute() {
                bail!("sync.verify_links entries must be relative to $HOME: {link}");
            }
        }
        Ok(())
    }

    /// Expanded dotfiles directory
    pub fn dotfiles_path(&self) -> PathBuf {
        paths::expand(&self.dotfiles_dir)
    }

    /// Expanded sync command
    pub fn sync_command(&self) -> PathBuf {
        match &self.sync.command {
            Some(command) => paths::expand(command),
            None => self.dotfiles_path().join("sync.sh"),
        }
    }
}
