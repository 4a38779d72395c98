//! Install command - the full bootstrap run
//!
//! config → OS check → profile → pre-flight → components → summary → sync

use anyhow::{Context, Result};
use dialoguer::Select;
use pkgkit::{CommandRunner, OsIdentity, PackageManager, Session, SystemRunner, os};
use std::sync::Arc;
use std::time::Instant;

use crate::Context as AppContext;
use crate::cli::Cli;
use crate::component::{InstallEnv, catalog};
use crate::config::Config;
use crate::engine::{self, InstallationRun, Plan, RunState};
use crate::preflight;
use crate::probe::{Probe, SystemProbe};
use crate::profile::{Profile, ProfileKind};
use crate::selector::{self, ComponentSelector};
use crate::sudo::SudoKeepalive;
use crate::sync::SyncStep;
use crate::{paths, terminal, ui};

/// Flags that shape one run.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub silent: bool,
    pub dry_run: bool,
    pub skip_sync: bool,
    /// Validate sudo up front and keep it fresh during the run
    pub keep_sudo_alive: bool,
}

pub fn run(ctx: &AppContext, cli: &Cli) -> Result<()> {
    if !ctx.quiet {
        ui::banner();
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if ctx.verbose > 0 {
        ui::kv("Dotfiles", &config.dotfiles_path().display().to_string());
    }
    let silent = terminal::is_silent(cli.yes);
    log::debug!("Silent mode: {silent}");

    let identity = os::detect();
    ui::kv("System", &identity.display_name());

    // Unsupported systems stop before any prompt or probe
    preflight::check_os(&identity)?;

    let kind = resolve_profile(cli.profile, silent)?;
    ui::kv("Profile", kind.as_str());

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new());
    let probe = SystemProbe::new(paths::home_dir()?, runner.clone());
    let mut selector = selector::for_terminal(silent);

    let opts = InstallOptions {
        silent,
        dry_run: cli.dry_run,
        skip_sync: cli.no_sync,
        keep_sudo_alive: true,
    };

    let run = install(
        &config,
        kind,
        &opts,
        &identity,
        &probe,
        runner,
        selector.as_mut(),
    )?;

    if run.state() == RunState::Completed && !run.tally.is_success() {
        ui::warn("Some components failed; re-run dotstrap to retry them");
    }
    Ok(())
}

/// Profile from the flag, else `quick` when silent, else a menu.
fn resolve_profile(flag: Option<ProfileKind>, silent: bool) -> Result<ProfileKind> {
    if let Some(kind) = flag {
        return Ok(kind);
    }
    if silent {
        log::info!("No profile given, defaulting to quick");
        return Ok(ProfileKind::Quick);
    }

    let items: Vec<String> = ProfileKind::ALL
        .iter()
        .map(|k| format!("{:<8} {}", k.as_str(), k.description()))
        .collect();

    let index = Select::new()
        .with_prompt("Choose an installation profile")
        .items(&items)
        .default(0)
        .interact()
        .context("Failed to read profile selection")?;

    Ok(ProfileKind::ALL[index])
}

/// Build the profile; custom asks the selector.
pub fn build_profile(
    kind: ProfileKind,
    config: &Config,
    selector: &mut dyn ComponentSelector,
) -> Result<Profile> {
    let min_disk_mb = config.disk.required_mb(kind);
    let profile = match kind {
        ProfileKind::Quick => Profile::quick(min_disk_mb),
        ProfileKind::Full => Profile::full(min_disk_mb),
        ProfileKind::Custom => {
            let optional: Vec<_> = catalog::optional().collect();
            let selected = selector.select(&optional)?;
            Profile::custom(&selected, min_disk_mb)
        }
    };
    log::debug!("Profile {}: {}", profile.kind, profile.keys().join(", "));
    Ok(profile)
}

/// Everything after profile resolution, with injectable system access.
pub fn install(
    config: &Config,
    kind: ProfileKind,
    opts: &InstallOptions,
    identity: &OsIdentity,
    probe: &dyn Probe,
    runner: Arc<dyn CommandRunner>,
    selector: &mut dyn ComponentSelector,
) -> Result<InstallationRun> {
    let started = Instant::now();
    let profile = build_profile(kind, config, selector)?;
    let mut run = InstallationRun::new(profile, opts.silent, opts.skip_sync);

    if opts.dry_run {
        preflight::check_os(identity)?;
        ui::header(&format!("Dry run: {} profile", run.profile.kind));
        Plan::build(&run.profile, probe).display();
        return Ok(run);
    }

    ui::section("Pre-flight");
    if let Err(e) = preflight::run_all(identity, probe, &config.preflight, run.profile.min_disk_mb) {
        run.fail()?;
        return Err(e).context("Pre-flight checks failed");
    }
    run.start()?;

    let pm = PackageManager::for_family(identity.family, runner.clone())?;
    let _sudo = if opts.keep_sudo_alive {
        SudoKeepalive::acquire(runner.clone(), "Install system packages")?
    } else {
        None
    };

    ui::section(&format!(
        "Installing {} component(s) with {}",
        run.profile.components.len(),
        pm.name()
    ));
    let mut session = Session::new();
    let mut env = InstallEnv {
        pm: &pm,
        session: &mut session,
        probe,
        os: identity,
        silent: opts.silent,
    };
    let outcome = engine::execute(&mut run, &mut env);
    engine::print_summary(&run.tally, started.elapsed());
    outcome?;

    if opts.skip_sync || !config.sync.enabled {
        ui::info("Skipping dotfiles sync");
    } else {
        ui::section("Sync");
        SyncStep::from_config(config)
            .run(runner.as_ref(), probe)
            .context("Dotfiles sync failed")?;
        ui::success("Dotfiles synced");
    }

    Ok(run)
}
