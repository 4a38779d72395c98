//! Execution engine - runs a profile's components with UI integration

use anyhow::Result;
use colored::Colorize;
use std::time::Duration;

use super::{InstallationRun, Tally};
use crate::checks;
use crate::component::{Component, InstallEnv, InstallError};
use crate::profile::FailurePolicy;
use crate::ui;

/// What happened to one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentResult {
    Skipped,
    Installed,
}

/// Check, install, then validate one component.
pub fn run_component(
    component: &Component,
    env: &mut InstallEnv<'_>,
) -> Result<ComponentResult, InstallError> {
    if checks::skip_if_installed(component, env.probe) {
        return Ok(ComponentResult::Skipped);
    }

    (component.install)(env)?;

    if let Some(validate) = component.validate {
        validate(env.probe)?;
    }
    Ok(ComponentResult::Installed)
}

/// Run every component of the profile in order.
///
/// The run must already be `Running`. Fixed profiles stop at the first
/// failure; custom profiles count failures and keep going. A failed
/// validation stops any profile.
pub fn execute(run: &mut InstallationRun, env: &mut InstallEnv<'_>) -> Result<()> {
    let components = run.profile.components.clone();
    let policy = run.profile.policy();
    let total = components.len();
    log::debug!(
        "Running {} profile: {} component(s), silent: {}, sync: {}",
        run.profile.kind,
        total,
        run.silent,
        !run.skip_sync
    );

    for (index, component) in components.iter().enumerate() {
        ui::step(
            index + 1,
            total,
            &format!("{} {}", component.key.bold(), component.description.dimmed()),
        );

        match run_component(component, env) {
            Ok(ComponentResult::Skipped) => {
                run.tally.skipped += 1;
                ui::dim("already installed, skipping");
            }
            Ok(ComponentResult::Installed) => {
                run.tally.installed += 1;
                ui::success(&format!("{} installed", component.key));
            }
            Err(err) => {
                let fatal = policy == FailurePolicy::FailFast
                    || matches!(err, InstallError::Validation(_));

                if err.is_prerequisite() {
                    ui::warn(&format!("{}: {err}", component.key));
                } else {
                    ui::error(&format!("{} failed: {err}", component.key));
                    if let Some(advice) = err.advice() {
                        ui::dim(&advice);
                    }
                }
                run.tally.record_failure(component.key, err.to_string());
                log::debug!(
                    "{} failed ({} failure(s) so far), fatal: {fatal}",
                    component.key,
                    run.tally.failed
                );

                if fatal {
                    run.fail()?;
                    return Err(anyhow::Error::new(err)
                        .context(format!("Component '{}' failed", component.key)));
                }
            }
        }
    }

    run.complete()?;
    Ok(())
}

/// Print final summary
pub fn print_summary(tally: &Tally, elapsed: Duration) {
    println!();
    if tally.is_success() {
        println!("  {} Installation complete!", "✓".green().bold());
    } else {
        println!(
            "  {} Installation finished with errors",
            "⚠".yellow().bold()
        );
    }

    if tally.installed > 0 {
        println!("    • {} installed", tally.installed);
    }
    if tally.skipped > 0 {
        println!("    • {} already present", tally.skipped);
    }
    if tally.failed > 0 {
        println!("    • {} {}", tally.failed, "failed".red());
        for (key, reason) in &tally.failures {
            println!("      {} {}: {}", "✗".red(), key, reason.dimmed());
        }
    }
    println!("    • took {}", ui::format_elapsed(elapsed));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{Check, ValidationError};
    use crate::component::test_support::Harness;
    use crate::engine::RunState;
    use crate::probe::Probe;
    use crate::profile::{Profile, ProfileKind};
    use pkgkit::{CommandSpec, ExecOutcome};

    fn install_a(env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
        env.run(CommandSpec::new("install-a")).map(drop)
    }

    fn install_b(env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
        env.run(CommandSpec::new("install-b")).map(drop)
    }

    fn install_c(env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
        env.run(CommandSpec::new("install-c")).map(drop)
    }

    fn install_needs_a(_env: &mut InstallEnv<'_>) -> Result<(), InstallError> {
        Err(InstallError::PrerequisiteMissing {
            component: "needs-a",
            prerequisite: "a",
        })
    }

    fn validate_never(probe: &dyn Probe) -> Result<(), ValidationError> {
        checks::validate_command(probe, "never-there")
    }

    const fn component(key: &'static str, check: Check, install: crate::component::InstallFn) -> Component {
        Component {
            key,
            description: "test component",
            check,
            install,
            validate: None,
            requires: &[],
            mandatory: false,
        }
    }

    static A: Component = component("a", Check::Binary("a-tool"), install_a);
    static B: Component = component("b", Check::Binary("b-tool"), install_b);
    static C: Component = component("c", Check::Binary("c-tool"), install_c);
    static NEEDS_A: Component = component("needs-a", Check::Binary("needs-a-tool"), install_needs_a);
    static BROKEN: Component = Component {
        validate: Some(validate_never),
        ..component("broken", Check::Binary("broken-tool"), install_a)
    };

    fn running(kind: ProfileKind, components: Vec<&'static Component>) -> InstallationRun {
        let mut run = InstallationRun::new(
            Profile {
                kind,
                components,
                min_disk_mb: 0,
            },
            true,
            true,
        );
        run.start().unwrap();
        run
    }

    #[test]
    fn test_run_component_skips_satisfied_check() {
        let mut harness = Harness::ubuntu();
        harness.probe.add_binary("a-tool");

        let result = run_component(&A, &mut harness.env()).unwrap();
        assert_eq!(result, ComponentResult::Skipped);
        assert!(harness.runner.lines().is_empty());
    }

    #[test]
    fn test_run_component_installs_then_validates() {
        let mut harness = Harness::ubuntu();
        let err = run_component(&BROKEN, &mut harness.env()).unwrap_err();

        assert!(matches!(err, InstallError::Validation(_)));
        assert_eq!(harness.runner.lines(), vec!["install-a"]);
    }

    #[test]
    fn test_custom_profile_continues_after_failure() {
        let mut harness = Harness::ubuntu();
        harness
            .runner
            .respond("install-b", ExecOutcome::failed(1, "boom"));
        let mut run = running(ProfileKind::Custom, vec![&A, &B, &C]);

        execute(&mut run, &mut harness.env()).unwrap();

        assert_eq!(run.state(), RunState::Completed);
        assert_eq!(run.tally.installed, 2);
        assert_eq!(run.tally.failed, 1);
        assert_eq!(run.tally.failures[0].0, "b");
        assert_eq!(
            harness.runner.lines(),
            vec!["install-a", "install-b", "install-c"]
        );
    }

    #[test]
    fn test_fixed_profile_fails_fast() {
        let mut harness = Harness::ubuntu();
        harness
            .runner
            .respond("install-b", ExecOutcome::failed(1, "boom"));
        let mut run = running(ProfileKind::Full, vec![&A, &B, &C]);

        let err = execute(&mut run, &mut harness.env()).unwrap_err();

        assert_eq!(err.to_string(), "Component 'b' failed");
        assert_eq!(run.state(), RunState::Failed);
        assert_eq!(run.tally.installed, 1);
        assert_eq!(harness.runner.count_exact("install-c"), 0);
    }

    #[test]
    fn test_validation_failure_is_fatal_for_custom() {
        let mut harness = Harness::ubuntu();
        let mut run = running(ProfileKind::Custom, vec![&BROKEN, &C]);

        assert!(execute(&mut run, &mut harness.env()).is_err());
        assert_eq!(run.state(), RunState::Failed);
        assert_eq!(harness.runner.count_exact("install-c"), 0);
    }

    #[test]
    fn test_prerequisite_missing_is_counted() {
        let mut harness = Harness::ubuntu();
        let mut run = running(ProfileKind::Custom, vec![&NEEDS_A, &C]);

        execute(&mut run, &mut harness.env()).unwrap();

        assert_eq!(run.state(), RunState::Completed);
        assert_eq!(run.tally.failed, 1);
        assert_eq!(run.tally.installed, 1);
        assert_eq!(run.tally.failures[0].1, "prerequisite missing: a");
    }

    #[test]
    fn test_skipped_components_are_tallied() {
        let mut harness = Harness::ubuntu();
        harness.probe.add_binary("a-tool");
        harness.probe.add_binary("c-tool");
        let mut run = running(ProfileKind::Quick, vec![&A, &B, &C]);

        execute(&mut run, &mut harness.env()).unwrap();

        assert_eq!(run.tally.skipped, 2);
        assert_eq!(run.tally.installed, 1);
        assert_eq!(harness.runner.lines(), vec!["install-b"]);
    }

    #[test]
    fn test_execute_requires_running_state() {
        let mut harness = Harness::ubuntu();
        let mut run = InstallationRun::new(
            Profile {
                kind: ProfileKind::Custom,
                components: vec![],
                min_disk_mb: 0,
            },
            true,
            true,
        );

        assert!(execute(&mut run, &mut harness.env()).is_err());
    }
}
