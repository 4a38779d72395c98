//! Test doubles for [`CommandRunner`].
//!
//! Enabled for this crate's tests and for downstream crates through the
//! `testing` feature.

use crate::exec::{CommandRunner, CommandSpec, ExecOutcome};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

type Effect = Box<dyn Fn(&CommandSpec) + Send + Sync>;

/// Runner that records every command and replays canned outcomes.
///
/// Commands succeed with empty stdout unless a rule registered with
/// [`RecordingRunner::respond`] matches. Rules match when their needle is a
/// substring of the command's display line; the most recently registered
/// matching rule wins.
///
/// Effects registered with [`RecordingRunner::on_success`] stand in for what
/// the real command would leave behind (installed binaries, cloned repos).
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    rules: Mutex<Vec<(String, ExecOutcome)>>,
    effects: Mutex<Vec<(String, Effect)>>,
}

impl fmt::Debug for RecordingRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingRunner")
            .field("calls", &lock(&self.calls).len())
            .field("rules", &lock(&self.rules).len())
            .field("effects", &lock(&self.effects).len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl RecordingRunner {
    /// Runner where everything succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `outcome` for commands whose display line contains `needle`.
    pub fn respond(&self, needle: &str, outcome: ExecOutcome) -> &Self {
        lock(&self.rules).push((needle.to_string(), outcome));
        self
    }

    /// Run `effect` after each successful command whose display line
    /// contains `needle`.
    pub fn on_success(
        &self,
        needle: &str,
        effect: impl Fn(&CommandSpec) + Send + Sync + 'static,
    ) -> &Self {
        lock(&self.effects).push((needle.to_string(), Box::new(effect)));
        self
    }

    /// Every command run so far.
    pub fn calls(&self) -> Vec<CommandSpec> {
        lock(&self.calls).clone()
    }

    /// Display lines of every command run so far.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.calls).iter().map(CommandSpec::display).collect()
    }

    /// Number of commands whose display line contains `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.display().contains(needle))
            .count()
    }

    /// Number of commands whose display line equals `line`.
    pub fn count_exact(&self, line: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.display() == line)
            .count()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> ExecOutcome {
        let line = spec.display();
        lock(&self.calls).push(spec.clone());

        let outcome = lock(&self.rules)
            .iter()
            .rev()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map_or_else(|| ExecOutcome::ok(""), |(_, outcome)| outcome.clone());

        if outcome.is_success() {
            for (needle, effect) in lock(&self.effects).iter() {
                if line.contains(needle.as_str()) {
                    effect(spec);
                }
            }
        }
        outcome
    }
}
