//! `dotstrap --list` - catalog and profiles at a glance

use anyhow::{Context, Result};
use colored::Colorize;
use pkgkit::SystemRunner;
use std::sync::Arc;

use crate::Context as AppContext;
use crate::cli::Cli;
use crate::component::{Component, catalog};
use crate::config::Config;
use crate::probe::{Probe, SystemProbe};
use crate::profile::{Profile, ProfileKind};
use crate::{paths, ui};

/// One catalog line as shown by `--list`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    key: &'static str,
    description: &'static str,
    installed: bool,
    notes: Vec<String>,
}

fn rows(components: &[Component], probe: &dyn Probe) -> Vec<Row> {
    components
        .iter()
        .map(|component| {
            let mut notes = Vec::new();
            if component.mandatory {
                notes.push("always installed".to_string());
            }
            if !component.requires.is_empty() {
                notes.push(format!("requires {}", component.requires.join(", ")));
            }
            Row {
                key: component.key,
                description: component.description,
                installed: component.check.evaluate(probe),
                notes,
            }
        })
        .collect()
}

fn profile_members(kind: ProfileKind, config: &Config) -> String {
    let mb = config.disk.required_mb(kind);
    let keys = match kind {
        ProfileKind::Quick => Profile::quick(mb).keys().join(", "),
        ProfileKind::Full => Profile::full(mb).keys().join(", "),
        ProfileKind::Custom => {
            let mandatory: Vec<_> = catalog::mandatory().map(|c| c.key).collect();
            format!("{} + your selection", mandatory.join(", "))
        }
    };
    format!("{keys} {}", format!("(needs {})", ui::format_mb(mb)).dimmed())
}

pub fn run(_ctx: &AppContext, cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let probe = SystemProbe::new(paths::home_dir()?, Arc::new(SystemRunner::new()));

    ui::header("Components");
    for row in rows(catalog::all(), &probe) {
        let status = if row.installed {
            "✓".green()
        } else {
            "✗".yellow()
        };
        let notes = if row.notes.is_empty() {
            String::new()
        } else {
            format!(" [{}]", row.notes.join("; ")).dimmed().to_string()
        };
        println!("  {} {:<12} {}{}", status, row.key.bold(), row.description, notes);
    }

    ui::header("Profiles");
    for kind in ProfileKind::ALL {
        ui::kv(kind.as_str(), kind.description());
        println!("    {}", profile_members(kind, &config));
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FakeProbe;

    #[test]
    fn test_rows_follow_catalog_order() {
        let probe = FakeProbe::new();
        let keys: Vec<_> = rows(catalog::all(), &probe).iter().map(|r| r.key).collect();
        let expected: Vec<_> = catalog::all().iter().map(|c| c.key).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_rows_reflect_installed_state() {
        let probe = FakeProbe::new().with_binaries(&["git", "curl", "stow"]);
        let rows = rows(catalog::all(), &probe);

        let base = rows.iter().find(|r| r.key == catalog::BASE).unwrap();
        assert!(base.installed);
        assert_eq!(base.notes, vec!["always installed"]);

        let node = rows.iter().find(|r| r.key == "node").unwrap();
        assert!(!node.installed);
        assert_eq!(node.notes, vec!["requires nvm"]);
    }

    #[test]
    fn test_profile_members_use_configured_disk() {
        let mut config = Config::default();
        config.disk.full_mb = 4096;

        let full = profile_members(ProfileKind::Full, &config);
        assert!(full.starts_with("base, "));
        assert!(full.contains("node"));
        assert!(full.contains(&ui::format_mb(4096)));

        let custom = profile_members(ProfileKind::Custom, &config);
        assert!(custom.starts_with("base + your selection"));
    }
}
