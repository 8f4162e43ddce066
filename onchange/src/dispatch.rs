//! Command dispatch.
//!
//! Runs the configured command through the host shell, with the watch root
//! as working directory and the child's stdout/stderr attached directly to
//! ours. Failures are logged and reported in a [`ProcessResult`]; they never
//! propagate to the caller.
//!
//! The shell is chosen from the host operating system alone: `cmd /C` on
//! Windows, `sh -c` everywhere else. Making the command text portable across
//! shells is left to the user.

use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use chrono::Utc;
use tokio::process::Command;
use tracing::{error, info};

use crate::types::{CommandSpec, ProcessResult};

/// Operating system family, as far as shell selection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Unix,
}

impl HostOs {
    /// The family this binary was built for.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }
}

/// Interpreter and arguments used to run a command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub program: &'static str,
    pub args: Vec<String>,
}

/// Chooses the interpreter for `command_text` on `os`.
#[must_use]
pub fn shell_invocation(os: HostOs, command_text: &str) -> ShellInvocation {
    match os {
        HostOs::Windows => ShellInvocation {
            program: "cmd",
            args: vec!["/C".to_string(), command_text.to_string()],
        },
        HostOs::Unix => ShellInvocation {
            program: "sh",
            args: vec!["-c".to_string(), command_text.to_string()],
        },
    }
}

/// Runs the configured command on demand.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    spec: CommandSpec,
    os: HostOs,
}

impl Dispatcher {
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            os: HostOs::current(),
        }
    }

    #[must_use]
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Runs the command to completion.
    ///
    /// Returns `None` without spawning anything when the command is empty.
    /// Otherwise returns the outcome, which has already been logged.
    pub async fn dispatch(&self) -> Option<ProcessResult> {
        if self.spec.is_empty() {
            return None;
        }

        let invocation = shell_invocation(self.os, &self.spec.command_text);
        info!(command = %self.spec.command_text, "Running command");

        let started_at = Utc::now();
        let clock = Instant::now();

        let status = Command::new(invocation.program)
            .args(&invocation.args)
            .current_dir(&self.spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await;

        let result = match status {
            Ok(status) => outcome(status, started_at, clock.elapsed()),
            Err(e) => ProcessResult::failed(
                None,
                format!("failed to launch {}: {e}", invocation.program),
                started_at,
                clock.elapsed(),
            ),
        };

        log_result(&self.spec, &result);
        Some(result)
    }
}

fn outcome(
    status: ExitStatus,
    started_at: chrono::DateTime<Utc>,
    duration: std::time::Duration,
) -> ProcessResult {
    if status.success() {
        ProcessResult::succeeded(started_at, duration)
    } else {
        ProcessResult::failed(status.code(), status.to_string(), started_at, duration)
    }
}

fn log_result(spec: &CommandSpec, result: &ProcessResult) {
    let duration_ms = result.duration.as_millis();
    if result.success {
        info!(
            command = %spec.command_text,
            duration_ms,
            started_at = %result.started_at.to_rfc3339(),
            "Command finished"
        );
    } else {
        error!(
            command = %spec.command_text,
            exit_code = ?result.exit_code,
            error = result.error.as_deref().unwrap_or("unknown error"),
            duration_ms,
            "Command execution failed"
        );
    }
}
