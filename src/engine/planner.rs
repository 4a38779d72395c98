//! Dry-run planning: what a profile would do on this machine.

use colored::Colorize;

use crate::component::Component;
use crate::probe::Probe;
use crate::profile::{Profile, ProfileKind};

#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub component: &'static Component,
    pub installed: bool,
}

/// Check status of every component in a profile, without installing.
#[derive(Debug, Clone)]
pub struct Plan {
    pub kind: ProfileKind,
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn build(profile: &Profile, probe: &dyn Probe) -> Self {
        let entries = profile
            .components
            .iter()
            .map(|&component| PlanEntry {
                component,
                installed: component.check.evaluate(probe),
            })
            .collect();

        Self {
            kind: profile.kind,
            entries,
        }
    }

    /// Components that would be installed.
    pub fn pending(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|e| !e.installed)
    }

    pub fn display(&self) {
        println!();
        for entry in &self.entries {
            let (symbol, status) = if entry.installed {
                ("○".dimmed(), "installed".dimmed())
            } else {
                ("+".green(), "will install".green())
            };
            println!(
                "  {} {:<12} {} {}",
                symbol,
                entry.component.key,
                status,
                format!("({})", entry.component.check).dimmed()
            );
        }

        let pending = self.pending().count();
        println!();
        if pending == 0 {
            println!("  {} Nothing to install for '{}'", "✓".green(), self.kind);
        } else {
            println!(
                "  {} {} of {} components would be installed",
                "ℹ".blue(),
                pending,
                self.entries.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FakeProbe;

    #[test]
    fn test_plan_reflects_probe() {
        let probe = FakeProbe::new().with_binaries(&["git", "curl", "stow", "zsh"]);
        let plan = Plan::build(&Profile::quick(1000), &probe);

        let installed: Vec<_> = plan
            .entries
            .iter()
            .filter(|e| e.installed)
            .map(|e| e.component.key)
            .collect();
        assert_eq!(installed, vec!["base"]);

        let pending: Vec<_> = plan.pending().map(|e| e.component.key).collect();
        assert_eq!(pending, vec!["shell", "cli-tools", "git-config"]);
    }

    #[test]
    fn test_plan_keeps_profile_order() {
        let probe = FakeProbe::new();
        let profile = Profile::custom(&["node", "neovim"], 1000);
        let plan = Plan::build(&profile, &probe);

        let keys: Vec<_> = plan.entries.iter().map(|e| e.component.key).collect();
        assert_eq!(keys, vec!["base", "neovim", "node"]);
        assert_eq!(plan.kind, ProfileKind::Custom);
    }
}
