//! Exec session types and the "already running" condition.

use std::sync::LazyLock;

use regex::Regex;

/// Command to run inside a running container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    /// User the command runs as. Empty means the image default.
    pub user: String,
    /// Command and arguments.
    pub command: Vec<String>,
}

impl ExecRequest {
    /// Creates an exec request.
    #[must_use]
    pub fn new(user: impl Into<String>, command: Vec<String>) -> Self {
        Self {
            user: user.into(),
            command,
        }
    }
}

/// Result of polling an exec session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecStatus {
    /// Whether the command is still running.
    pub running: bool,
    /// Exit code, once finished.
    pub exit_code: Option<i64>,
}

/// Combined output and exit code of a finished exec session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit code returned by the command.
    pub exit_code: i64,
    /// Interleaved stdout and stderr, trimmed.
    pub output: String,
}

#[allow(clippy::expect_used)]
static ALREADY_RUNNING_OUTPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Error(?: response from daemon)?: Exec command .+ is already running")
        .expect("valid already-running output pattern")
});

#[allow(clippy::expect_used)]
static ALREADY_RUNNING_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Exec command .+ is already running")
        .expect("valid already-running message pattern")
});

/// Returns whether exec output carries the engine's
/// `Error: Exec command <id> is already running` complaint.
#[must_use]
pub fn is_already_running(output: &str) -> bool {
    ALREADY_RUNNING_OUTPUT.is_match(output)
}

/// Returns whether an engine API error message reports that the exec is
/// already running. The API returns the bare message without the `Error:`
/// prefix a client prints.
#[must_use]
pub fn is_already_running_message(message: &str) -> bool {
    ALREADY_RUNNING_MESSAGE.is_match(message)
}
