//! Centralized path resolution for dotstrap
//!
//! # Environment Variables
//!
//! - `DOTSTRAP_CONFIG_DIR` - Override config directory (e.g., `~/.dotfiles/dotstrap`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `DOTSTRAP_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/dotstrap` (if set)
//! 3. `~/.config/dotstrap`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "DOTSTRAP_CONFIG_DIR";

/// Get the dotstrap config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        let path = PathBuf::from(xdg_config).join("dotstrap");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = home_dir()?;
    let path = home.join(".config").join("dotstrap");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// The user's home directory
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Could not determine home directory")
}

/// Expand ~ and environment variables in a path string.
///
/// All modules should use this instead of calling shellexpand directly.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Run `f` with `key` set to `value`, restoring the previous value after.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: Tests run in isolation
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/config/path", || {
            let result = config_dir().unwrap();
            assert_eq!(result, PathBuf::from("/custom/config/path"));
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_absolute() {
        let result = expand("/absolute/path");
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_with_env_var() {
        with_env_var("DOTSTRAP_TEST_VAR", "test_value", || {
            let result = expand("/path/$DOTSTRAP_TEST_VAR/file");
            assert_eq!(result, PathBuf::from("/path/test_value/file"));
        });
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}
