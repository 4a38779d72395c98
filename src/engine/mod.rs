//! Execution engine for dotstrap
//!
//! The engine owns:
//! 1. The run state machine (`NotStarted → Running → Completed | Failed`)
//! 2. The per-component protocol (check, install, validate)
//! 3. The profile loop, fail-fast or fail-tolerant
//! 4. Dry-run plans

pub mod executor;
pub mod planner;

use std::fmt;
use thiserror::Error;

use crate::profile::Profile;

pub use executor::{ComponentResult, execute, print_summary, run_component};
pub use planner::Plan;

/// Lifecycle of one installation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid run transition: {from} → {to}")]
pub struct TransitionError {
    pub from: RunState,
    pub to: RunState,
}

/// Per-run counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tally {
    pub installed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// (component, reason) for every failure
    pub failures: Vec<(String, String)>,
}

impl Tally {
    pub fn record_failure(&mut self, key: &str, reason: String) {
        self.failed += 1;
        self.failures.push((key.to_string(), reason));
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// One transient installation run.
#[derive(Debug)]
pub struct InstallationRun {
    pub profile: Profile,
    pub silent: bool,
    pub skip_sync: bool,
    state: RunState,
    pub tally: Tally,
}

impl InstallationRun {
    pub fn new(profile: Profile, silent: bool, skip_sync: bool) -> Self {
        Self {
            profile,
            silent,
            skip_sync,
            state: RunState::NotStarted,
            tally: Tally::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Pre-flight passed.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(RunState::Running, &[RunState::NotStarted])
    }

    /// Every component was attempted.
    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.transition(RunState::Completed, &[RunState::Running])
    }

    /// Pre-flight or a fatal component failure.
    pub fn fail(&mut self) -> Result<(), TransitionError> {
        self.transition(RunState::Failed, &[RunState::NotStarted, RunState::Running])
    }

    fn transition(&mut self, to: RunState, from: &[RunState]) -> Result<(), TransitionError> {
        if !from.contains(&self.state) {
            return Err(TransitionError {
                from: self.state,
                to,
            });
        }
        log::debug!("Run state: {} → {}", self.state, to);
        self.state = to;
        Ok(())
    }
}
