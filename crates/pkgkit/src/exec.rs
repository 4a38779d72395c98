//! External process execution with typed outcomes.
//!
//! Every shell-out (package managers, installer scripts, downloads) goes
//! through a [`CommandRunner`] so callers can tell a missing tool from a
//! network failure, a timeout, or a plain non-zero exit.

use std::fmt;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// curl exit codes that mean the network, not the request, failed
const CURL_NETWORK_CODES: &[i32] = &[5, 6, 7, 28, 35, 52, 56];

const NETWORK_MARKERS: &[&str] = &[
    "could not resolve host",
    "temporary failure in name resolution",
    "failed to connect",
    "network is unreachable",
    "connection timed out",
    "connection refused",
    "failed to fetch",
    "curl error",
];

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Description of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
    /// Needs root; wrapped with `sudo` when not already root
    pub privileged: bool,
    /// Data written to the child's stdin
    pub stdin: Option<String>,
    /// Kill the child after this long
    pub timeout: Option<Duration>,
    /// Show output live; stderr is still captured for classification
    pub stream: bool,
}

impl CommandSpec {
    /// Create a spec for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            privileged: false,
            stdin: None,
            timeout: None,
            stream: false,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Mark the command as requiring root.
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Feed `input` to the child's stdin.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Kill the child if it runs longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Show the child's output live.
    pub fn streamed(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Command line as shown to users (without sudo or env).
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Typed result of running an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Exit status zero
    Success {
        /// Captured stdout (empty when streamed)
        stdout: String,
    },
    /// The program ran and exited non-zero
    NonZeroExit {
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Captured stderr
        stderr: String,
    },
    /// The program was killed after exceeding its timeout
    TimedOut {
        /// Configured timeout
        after: Duration,
    },
    /// The program failed because the network was unreachable
    NetworkError {
        /// What the program reported
        message: String,
    },
    /// The program does not exist
    NotFound {
        /// Program that could not be spawned
        program: String,
    },
    /// Spawning or waiting failed for another reason
    SpawnFailed {
        /// OS error text
        message: String,
    },
}

impl ExecOutcome {
    /// Successful outcome with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::Success {
            stdout: stdout.into(),
        }
    }

    /// Non-zero exit with the given code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self::NonZeroExit {
            code: Some(code),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited zero.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Captured stdout of a successful command.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            Self::Success { stdout } => Some(stdout),
            _ => None,
        }
    }

    /// One-line reason for a failed outcome.
    pub fn describe(&self) -> String {
        match self {
            Self::Success { .. } => "succeeded".to_string(),
            Self::NonZeroExit { code, stderr } => {
                let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                let detail = stderr.trim().lines().last().unwrap_or_default();
                if detail.is_empty() {
                    format!("exited with status {code}")
                } else {
                    format!("exited with status {code}: {detail}")
                }
            }
            Self::TimedOut { after } => format!("timed out after {}s", after.as_secs()),
            Self::NetworkError { message } => format!("network error: {message}"),
            Self::NotFound { program } => format!("{program} not found"),
            Self::SpawnFailed { message } => format!("could not start: {message}"),
        }
    }

    /// Classify a finished process.
    pub fn from_exit(program: &str, code: Option<i32>, stdout: String, stderr: String) -> Self {
        if code == Some(0) {
            return Self::Success { stdout };
        }

        let is_curl = program == "curl" || program.ends_with("/curl");
        if is_curl && code.is_some_and(|c| CURL_NETWORK_CODES.contains(&c)) {
            return Self::NetworkError {
                message: first_line_or(&stderr, "curl could not reach the host"),
            };
        }

        let lower = stderr.to_lowercase();
        if NETWORK_MARKERS.iter().any(|m| lower.contains(m)) {
            return Self::NetworkError {
                message: first_line_or(&stderr, "network unreachable"),
            };
        }

        Self::NonZeroExit { code, stderr }
    }
}

fn first_line_or(text: &str, fallback: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Executes [`CommandSpec`]s.
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion.
    fn run(&self, spec: &CommandSpec) -> ExecOutcome;
}

/// Runner that spawns real processes.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    use_sudo: bool,
}

impl SystemRunner {
    /// Create a runner; privileged commands use `sudo` unless already root.
    pub fn new() -> Self {
        Self {
            use_sudo: !is_root(),
        }
    }

    fn build(&self, spec: &CommandSpec) -> Command {
        let mut command = if spec.privileged && self.use_sudo {
            let mut c = Command::new("sudo");
            // sudo resets the environment, so pass variables as assignments
            for (key, value) in &spec.env {
                c.arg(format!("{key}={value}"));
            }
            c.arg(&spec.program);
            c
        } else {
            let mut c = Command::new(&spec.program);
            c.envs(spec.env.iter().map(|(k, v)| (k, v)));
            c
        };
        command.args(&spec.args);

        command.stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else if spec.stream {
            Stdio::inherit()
        } else {
            Stdio::null()
        });
        // stderr is always piped; streamed commands forward it as it arrives
        command.stdout(if spec.stream {
            Stdio::inherit()
        } else {
            Stdio::piped()
        });
        command.stderr(Stdio::piped());
        command
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> ExecOutcome {
        let mut command = self.build(spec);
        log::debug!(
            "Executing: {}{}",
            if spec.privileged && self.use_sudo { "sudo " } else { "" },
            spec.display()
        );

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let program = if spec.privileged && self.use_sudo {
                    "sudo".to_string()
                } else {
                    spec.program.clone()
                };
                return ExecOutcome::NotFound { program };
            }
            Err(e) => {
                return ExecOutcome::SpawnFailed {
                    message: e.to_string(),
                };
            }
        };

        if let (Some(input), Some(mut pipe)) = (&spec.stdin, child.stdin.take()) {
            if let Err(e) = pipe.write_all(input.as_bytes()) {
                log::warn!("Could not write stdin of {}: {e}", spec.program);
            }
            // pipe dropped here so the child sees EOF
        }

        let stdout_reader = child.stdout.take().map(|out| thread::spawn(move || drain(out)));
        let stream = spec.stream;
        let stderr_reader = child.stderr.take().map(|err| {
            thread::spawn(move || if stream { tee(err, std::io::stderr()) } else { drain(err) })
        });

        let status = match wait_with_timeout(&mut child, spec.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return ExecOutcome::TimedOut {
                    after: spec.timeout.unwrap_or_default(),
                };
            }
            Err(e) => {
                return ExecOutcome::SpawnFailed {
                    message: e.to_string(),
                };
            }
        };

        let stdout = stdout_reader
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        let stderr = stderr_reader
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        ExecOutcome::from_exit(&spec.program, status.code(), stdout, stderr)
    }
}

fn drain(mut reader: impl Read) -> String {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Copy `reader` to `sink` as it arrives, keeping what was read.
fn tee(mut reader: impl Read, mut sink: impl Write) -> String {
    let mut kept = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let _ = sink.write_all(&chunk[..n]);
                let _ = sink.flush();
                kept.extend_from_slice(&chunk[..n]);
            }
        }
    }
    String::from_utf8_lossy(&kept).into_owned()
}

/// Wait for the child, returning `None` if the timeout elapsed first.
fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Whether the current process runs as root.
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder_and_display() {
        let spec = CommandSpec::new("apt-get")
            .args(["install", "-y"])
            .arg("git")
            .env("DEBIAN_FRONTEND", "noninteractive")
            .privileged();

        assert_eq!(spec.display(), "apt-get install -y git");
        assert!(spec.privileged);
        assert_eq!(spec.env.len(), 1);
        assert_eq!(CommandSpec::new("true").display(), "true");
    }

    #[test]
    fn test_from_exit_success() {
        let outcome = ExecOutcome::from_exit("git", Some(0), "ok".into(), String::new());
        assert_eq!(outcome.stdout(), Some("ok"));
        assert!(outcome.is_success());
    }

    #[test]
    fn test_from_exit_curl_network_code() {
        let outcome = ExecOutcome::from_exit(
            "curl",
            Some(6),
            String::new(),
            "curl: (6) Could not resolve host: example.invalid".into(),
        );
        assert!(matches!(outcome, ExecOutcome::NetworkError { .. }));
    }

    #[test]
    fn test_from_exit_network_marker_in_stderr() {
        let outcome = ExecOutcome::from_exit(
            "git",
            Some(128),
            String::new(),
            "fatal: unable to access: Could not resolve host: github.com".into(),
        );
        assert!(matches!(outcome, ExecOutcome::NetworkError { .. }));
    }

    #[test]
    fn test_from_exit_plain_failure() {
        let outcome = ExecOutcome::from_exit(
            "apt-get",
            Some(100),
            String::new(),
            "E: Unable to locate package nope".into(),
        );
        assert_eq!(
            outcome.describe(),
            "exited with status 100: E: Unable to locate package nope"
        );
    }

    #[test]
    fn test_describe_signal_and_timeout() {
        let killed = ExecOutcome::NonZeroExit {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(killed.describe(), "exited with status signal");

        let timed_out = ExecOutcome::TimedOut {
            after: Duration::from_secs(30),
        };
        assert_eq!(timed_out.describe(), "timed out after 30s");
    }

    #[test]
    fn test_system_runner_missing_program() {
        let runner = SystemRunner { use_sudo: false };
        let outcome = runner.run(&CommandSpec::new("definitely-not-a-real-program-xyz"));
        assert!(matches!(outcome, ExecOutcome::NotFound { .. }));
    }

    #[test]
    fn test_system_runner_captures_stdout_and_stdin() {
        let runner = SystemRunner { use_sudo: false };
        let outcome = runner.run(&CommandSpec::new("cat").stdin("hello"));
        assert_eq!(outcome.stdout(), Some("hello"));
    }

    #[test]
    fn test_streamed_command_keeps_stderr() {
        let runner = SystemRunner { use_sudo: false };
        let outcome = runner.run(
            &CommandSpec::new("sh")
                .arg("-c")
                .arg("echo 'E: Could not get lock /var/lib/dpkg/lock-frontend' >&2; exit 100")
                .streamed(),
        );

        match &outcome {
            ExecOutcome::NonZeroExit { code, stderr } => {
                assert_eq!(*code, Some(100));
                assert!(stderr.contains("Could not get lock"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            crate::error::ErrorCategory::from_outcome(&outcome),
            crate::error::ErrorCategory::Locked
        );
    }

    #[test]
    fn test_tee_forwards_and_keeps() {
        let mut sink = Vec::new();
        let kept = tee("warning: retrying\n".as_bytes(), &mut sink);
        assert_eq!(kept, "warning: retrying\n");
        assert_eq!(sink, b"warning: retrying\n");
    }

    #[test]
    fn test_curl_failure_is_network_error() {
        let runner = SystemRunner { use_sudo: false };
        let outcome = runner.run(
            &CommandSpec::new("curl")
                .args(["-fsSL", "-o", "/dev/null", "http://127.0.0.1:1/install.sh"])
                .timeout(Duration::from_secs(30)),
        );
        assert!(
            matches!(outcome, ExecOutcome::NetworkError { .. }),
            "unexpected outcome: {outcome:?}"
        );
    }

    #[test]
    fn test_system_runner_timeout() {
        let runner = SystemRunner { use_sudo: false };
        let outcome = runner.run(
            &CommandSpec::new("sleep")
                .arg("5")
                .timeout(Duration::from_millis(200)),
        );
        assert!(matches!(outcome, ExecOutcome::TimedOut { .. }));
    }
}
