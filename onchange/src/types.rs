//! Shared data types for the watch pipeline.
//!
//! These types flow between the notifier, the event loop and the command
//! dispatcher. None of them are persisted.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Kind of filesystem operation reported for a path.
///
/// Only [`Operation::Create`] and [`Operation::Write`] trigger the command;
/// the remaining variants are kept distinct so logs can say what was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// A file or directory was created.
    Create,
    /// File contents were written.
    Write,
    /// A file or directory was removed.
    Remove,
    /// A file or directory was renamed or moved.
    Rename,
    /// Metadata, access, or an operation the platform could not describe.
    Other,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Write => "write",
            Self::Remove => "remove",
            Self::Rename => "rename",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A single change reported by the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Absolute (or root-joined) path of the changed entry.
    pub path: PathBuf,
    /// What happened to it.
    pub operation: Operation,
}

impl ChangeRecord {
    pub fn new(path: impl Into<PathBuf>, operation: Operation) -> Self {
        Self {
            path: path.into(),
            operation,
        }
    }
}

/// The command to run and where to run it.
///
/// Built once at startup and shared read-only by every dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Text handed to the host shell. Empty means log-only mode.
    pub command_text: String,
    /// Working directory for the subprocess (the watch root).
    pub working_dir: PathBuf,
}

impl CommandSpec {
    pub fn new(command_text: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            command_text: command_text.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Returns `true` when there is no command to run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.command_text.trim().is_empty()
    }

    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

/// Outcome of one command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// `true` when the process launched and exited with status zero.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    /// Launch failure or exit status description when `success` is false.
    pub error: Option<String>,
    /// Wall-clock start time.
    pub started_at: DateTime<Utc>,
    /// Time from spawn to exit.
    pub duration: Duration,
}

impl ProcessResult {
    pub(crate) fn succeeded(started_at: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            error: None,
            started_at,
            duration,
        }
    }

    pub(crate) fn failed(
        exit_code: Option<i32>,
        error: impl Into<String>,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            exit_code,
            error: Some(error.into()),
            started_at,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_display() {
        assert_eq!(Operation::Create.to_string(), "create");
        assert_eq!(Operation::Write.to_string(), "write");
        assert_eq!(Operation::Remove.to_string(), "remove");
        assert_eq!(Operation::Rename.to_string(), "rename");
        assert_eq!(Operation::Other.to_string(), "other");
    }

    #[test]
    fn command_spec_empty_detection() {
        assert!(CommandSpec::new("", "/tmp").is_empty());
        assert!(CommandSpec::new("   ", "/tmp").is_empty());
        assert!(!CommandSpec::new("echo hi", "/tmp").is_empty());
    }

    #[test]
    fn process_result_constructors() {
        let now = Utc::now();
        let ok = ProcessResult::succeeded(now, Duration::from_millis(5));
        assert!(ok.success);
        assert_eq!(ok.exit_code, Some(0));
        assert!(ok.error.is_none());

        let failed = ProcessResult::failed(Some(2), "exit status: 2", now, Duration::ZERO);
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(2));
        assert_eq!(failed.error.as_deref(), Some("exit status: 2"));
    }
}
