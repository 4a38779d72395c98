mod checks;
mod cli;
mod commands;
mod component;
mod config;
mod engine;
mod paths;
mod preflight;
mod probe;
mod profile;
mod progress;
mod selector;
mod sudo;
mod sync;
mod terminal;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::Cli;
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "dotstrap", &mut io::stdout());
        return Ok(());
    }

    if cli.list {
        return commands::list::run(&ctx, &cli);
    }

    commands::install::run(&ctx, &cli)
}
