//! Domain primitive types used across the mqfixture workspace.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;

/// Engine-assigned identifier of a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine-assigned identifier of an exec session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecId(String);

impl ExecId {
    /// Creates an exec ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine-assigned identifier of a network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(String);

impl NetworkId {
    /// Creates a network ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a container as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerState {
    /// Created but never started.
    Created,
    /// Actively running.
    Running,
    /// Paused by the engine.
    Paused,
    /// Restarting under a restart policy.
    Restarting,
    /// Being removed.
    Removing,
    /// Process has exited.
    Exited,
    /// Engine gave up on the container.
    Dead,
    /// The engine did not report a state.
    Unknown,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Identity of the test owning a set of fixtures.
///
/// Every per-test resource (container, volume, network, image tag,
/// coverage file, termination log) is named after it, which is what keeps
/// concurrently running tests from stepping on each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestRun {
    name: String,
}

impl TestRun {
    /// Creates a test run from a test name.
    ///
    /// Characters that are not legal in a container name are replaced with
    /// `-`, and leading separators are dropped.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        let sanitized: String = name
            .as_ref()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let trimmed = sanitized.trim_start_matches(['_', '.', '-']);
        let name = if trimmed.is_empty() {
            "fixture".to_string()
        } else {
            trimmed.to_string()
        };
        Self { name }
    }

    /// Creates a test run named after the current thread.
    ///
    /// The libtest harness names each test thread after the test path, so
    /// inside a `#[test]` or a current-thread `#[tokio::test]` this yields
    /// e.g. `lifecycle--starts_container` for `lifecycle::starts_container`.
    #[must_use]
    pub fn from_current_thread() -> Self {
        let thread = std::thread::current();
        Self::new(thread.name().unwrap_or("fixture").replace("::", "--"))
    }

    /// Returns the sanitized test name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name given to the test's container.
    #[must_use]
    pub fn container_name(&self) -> &str {
        &self.name
    }

    /// Name given to the test's volume.
    #[must_use]
    pub fn volume_name(&self) -> &str {
        &self.name
    }

    /// Name given to the test's network.
    #[must_use]
    pub fn network_name(&self) -> &str {
        &self.name
    }

    /// Image tag used for images built by the test.
    #[must_use]
    pub fn image_tag(&self) -> String {
        self.name.to_lowercase()
    }

    /// Coverage file name associated with the test.
    #[must_use]
    pub fn coverage_file_name(&self) -> String {
        format!("{}.cov", self.name)
    }

    /// Path of the test's termination-log file inside `dir`.
    #[must_use]
    pub fn termination_log_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}{}", self.name, constants::TERMINATION_LOG_SUFFIX))
    }
}

impl fmt::Display for TestRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_keeps_plain_names() {
        let run = TestRun::new("TestGoldenPath");
        assert_eq!(run.name(), "TestGoldenPath");
        assert_eq!(run.image_tag(), "testgoldenpath");
        assert_eq!(run.coverage_file_name(), "TestGoldenPath.cov");
    }

    #[test]
    fn test_run_replaces_illegal_characters() {
        let run = TestRun::new("TestSecurity/subtest one");
        assert_eq!(run.name(), "TestSecurity-subtest-one");
    }

    #[test]
    fn test_run_drops_leading_separators() {
        assert_eq!(TestRun::new("--x").name(), "x");
        assert_eq!(TestRun::new("///").name(), "fixture");
    }

    #[test]
    fn termination_log_path_uses_suffix() {
        let run = TestRun::new("TestStop");
        assert_eq!(
            run.termination_log_path(Path::new("/tmp")),
            PathBuf::from("/tmp/TestStop-termination-log")
        );
    }

    #[test]
    fn from_current_thread_uses_test_name() {
        let run = TestRun::from_current_thread();
        assert!(run.name().contains("from_current_thread_uses_test_name"));
    }

    #[test]
    fn container_state_display() {
        assert_eq!(ContainerState::Exited.to_string(), "exited");
    }
}
