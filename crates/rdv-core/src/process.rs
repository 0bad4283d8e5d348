//! Child process execution
//!
//! Runs one command with a fully specified environment, stdio attached to
//! ours, and blocks until it exits. There is no timeout and no signal
//! forwarding; the child shares our process group and sees terminal
//! signals directly.

use std::process::{Command, ExitStatus, Stdio};

use crate::error::{RdvError, Result};
use crate::EnvMap;

/// How a child that started ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOutcome {
    /// Exited on its own with this code
    Exited(i32),
    /// Killed by this signal
    Signaled(i32),
}

impl ChildOutcome {
    /// Exit code to report as our own (128 + signal for signals)
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) => 128 + signal,
        }
    }

    pub fn success(self) -> bool {
        self == Self::Exited(0)
    }

    fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signaled(signal);
            }
        }

        Self::Exited(1)
    }
}

/// Run `command` (program followed by its arguments) with exactly `env`.
///
/// The child's environment is cleared first; callers that want the current
/// environment must have composed it into `env`.
pub fn run(command: &[String], env: &EnvMap) -> Result<ChildOutcome> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| RdvError::usage("provide a command to run, e.g. rdv exec --aws dev -- env"))?;

    tracing::debug!(program = %program, args = args.len(), vars = env.len(), "spawning child");

    let status = Command::new(program)
        .args(args)
        .env_clear()
        .envs(env)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| RdvError::SpawnFailed {
            program: program.clone(),
            source,
        })?;

    let outcome = ChildOutcome::from_status(status);
    tracing::debug!(?outcome, "child exited");
    Ok(outcome)
}
