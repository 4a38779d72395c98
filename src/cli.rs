use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

use crate::profile::ProfileKind;

#[derive(Parser, Debug)]
#[command(name = "dotstrap")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Bootstrap a Linux machine from your dotfiles", long_about = None)]
pub struct Cli {
    /// Installation profile (prompted for when omitted)
    #[arg(short, long, value_enum, env = "DOTSTRAP_PROFILE")]
    pub profile: Option<ProfileKind>,

    /// Non-interactive: accept every prompt (implied under CI or without a TTY)
    #[arg(short, long)]
    pub yes: bool,

    /// Skip the dotfiles sync step
    #[arg(long)]
    pub no_sync: bool,

    /// Show what would be installed without installing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// List components and profiles, then exit
    #[arg(short, long)]
    pub list: bool,

    /// Config file (default: ~/.config/dotstrap/config.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}
