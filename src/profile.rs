//! Installation profiles.
//!
//! `quick` and `full` are fixed component lists; `custom` is the mandatory
//! base plus whatever the user selected. Every profile lists components in
//! catalog order.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::component::{Component, catalog};

const QUICK_COMPONENTS: &[&str] = &[catalog::BASE, "shell", "cli-tools", "git-config"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Shell, CLI tools and git defaults
    Quick,
    /// Everything in the catalog
    Full,
    /// Pick components interactively
    Custom,
}

impl ProfileKind {
    pub const ALL: [Self; 3] = [Self::Quick, Self::Full, Self::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Full => "full",
            Self::Custom => "custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Quick => "Essentials: shell, CLI tools and git defaults",
            Self::Full => "Everything: editors, tmux and Node.js too",
            Self::Custom => "Choose components yourself",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the engine reacts to a failing component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run at the first failure
    FailFast,
    /// Count the failure and carry on
    Tolerant,
}

/// A resolved, immutable list of components to run.
#[derive(Debug, Clone)]
pub struct Profile {
    pub kind: ProfileKind,
    pub components: Vec<&'static Component>,
    pub min_disk_mb: u64,
}

impl Profile {
    pub fn quick(min_disk_mb: u64) -> Self {
        Self {
            kind: ProfileKind::Quick,
            components: catalog::all()
                .iter()
                .filter(|c| c.mandatory || QUICK_COMPONENTS.contains(&c.key))
                .collect(),
            min_disk_mb,
        }
    }

    pub fn full(min_disk_mb: u64) -> Self {
        Self {
            kind: ProfileKind::Full,
            components: catalog::all().iter().collect(),
            min_disk_mb,
        }
    }

    /// Mandatory components plus `selected`, de-duplicated, in catalog order.
    pub fn custom(selected: &[&str], min_disk_mb: u64) -> Self {
        for key in selected {
            if catalog::find(key).is_none() {
                log::warn!("Ignoring unknown component '{key}'");
            }
        }

        Self {
            kind: ProfileKind::Custom,
            components: catalog::all()
                .iter()
                .filter(|c| c.mandatory || selected.contains(&c.key))
                .collect(),
            min_disk_mb,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        match self.kind {
            ProfileKind::Custom => FailurePolicy::Tolerant,
            ProfileKind::Quick | ProfileKind::Full => FailurePolicy::FailFast,
        }
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_profile() {
        let profile = Profile::quick(1000);
        assert_eq!(
            profile.keys(),
            vec!["base", "shell", "cli-tools", "git-config"]
        );
        assert_eq!(profile.policy(), FailurePolicy::FailFast);
        assert_eq!(profile.min_disk_mb, 1000);
    }

    #[test]
    fn test_full_profile_is_whole_catalog() {
        let profile = Profile::full(2000);
        assert_eq!(profile.components.len(), catalog::all().len());
        assert_eq!(profile.keys()[0], catalog::BASE);
        assert_eq!(profile.policy(), FailurePolicy::FailFast);
    }

    #[test]
    fn test_custom_always_includes_base() {
        let profile = Profile::custom(&[], 1000);
        assert_eq!(profile.keys(), vec!["base"]);
        assert_eq!(profile.policy(), FailurePolicy::Tolerant);
    }

    #[test]
    fn test_custom_uses_catalog_order_and_dedups() {
        let profile = Profile::custom(&["node", "tmux", "base", "nvm", "tmux"], 1000);
        assert_eq!(profile.keys(), vec!["base", "tmux", "nvm", "node"]);
    }

    #[test]
    fn test_custom_ignores_unknown_keys() {
        let profile = Profile::custom(&["emacs", "neovim"], 1000);
        assert_eq!(profile.keys(), vec!["base", "neovim"]);
    }

    #[test]
    fn test_every_profile_contains_base() {
        for profile in [
            Profile::quick(0),
            Profile::full(0),
            Profile::custom(&["tmux"], 0),
        ] {
            assert!(profile.keys().contains(&catalog::BASE), "{}", profile.kind);
        }
    }

    #[test]
    fn test_kind_serde_and_display() {
        let kind: ProfileKind = serde_json::from_str("\"full\"").unwrap();
        assert_eq!(kind, ProfileKind::Full);
        assert_eq!(ProfileKind::Custom.to_string(), "custom");
    }
}
