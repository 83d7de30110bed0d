//! Teardown of fixture containers.
//!
//! Cleanup runs a fixed sequence of steps. Each step is isolated: a failed
//! step is logged and recorded, and the remaining steps still run, so a
//! container that refuses to stop is still removed and its diagnostics are
//! still collected.

use std::fmt;

use mqfixture_common::error::{FixtureError, Result};
use mqfixture_engine::backend::RemoveOptions;

use crate::fixture::{ContainerHandle, Fixture};
use crate::{coverage, termination};

/// One step of [`Fixture::stop_and_remove`], in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanupStep {
    /// Inspect the container and log the result.
    Inspect,
    /// Stop the container.
    Stop,
    /// Rename the coverage output after the test.
    Coverage,
    /// Capture and log the container logs.
    Logs,
    /// Capture and log the termination message.
    TerminationMessage,
    /// Delete the host termination-log file.
    TerminationLog,
    /// Remove the container and its anonymous volumes.
    Remove,
}

impl fmt::Display for CleanupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inspect => "inspect",
            Self::Stop => "stop",
            Self::Coverage => "coverage",
            Self::Logs => "logs",
            Self::TerminationMessage => "termination message",
            Self::TerminationLog => "termination log",
            Self::Remove => "remove",
        };
        f.pad(s)
    }
}

/// A cleanup step that failed.
#[derive(Debug)]
pub struct CleanupFailure {
    /// The step that failed.
    pub step: CleanupStep,
    /// Why it failed.
    pub error: FixtureError,
}

/// Outcome of [`Fixture::stop_and_remove`].
#[derive(Debug, Default)]
pub struct CleanupReport {
    failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Records the result of a step, returning its value on success.
    pub fn record<T>(&mut self, step: CleanupStep, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(%step, error = %error, "cleanup step failed");
                self.failures.push(CleanupFailure { step, error });
                None
            }
        }
    }

    /// Returns true if every step succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failed steps, in execution order.
    #[must_use]
    pub fn failures(&self) -> &[CleanupFailure] {
        &self.failures
    }

    /// Returns true unless the container removal failed.
    #[must_use]
    pub fn removed(&self) -> bool {
        !self.failures.iter().any(|f| f.step == CleanupStep::Remove)
    }

    /// Turns the report into an error if the container was left behind.
    ///
    /// Failures of the diagnostic steps are only logged; a container that
    /// could not be removed leaks into the next test and fails the caller.
    ///
    /// # Errors
    ///
    /// Returns the removal error if the container could not be removed.
    pub fn into_result(self) -> Result<()> {
        match self.failures.into_iter().find(|f| f.step == CleanupStep::Remove) {
            Some(failure) => Err(failure.error),
            None => Ok(()),
        }
    }
}

impl Fixture {
    /// Stops and removes a container, collecting its diagnostics.
    ///
    /// Steps run in [`CleanupStep`] order and each runs regardless of the
    /// outcome of the previous ones. A container that is already gone
    /// counts as removed.
    pub async fn stop_and_remove(&self, handle: &ContainerHandle) -> CleanupReport {
        let mut report = CleanupReport::default();

        let inspected = self.engine.inspect_container(&handle.id).await;
        if let Some(details) = report.record(CleanupStep::Inspect, inspected) {
            match serde_json::to_string_pretty(&details.raw) {
                Ok(dump) => {
                    tracing::info!(
                        id = %handle.id,
                        state = %details.state,
                        "inspected container:\n{dump}"
                    );
                }
                Err(e) => {
                    tracing::warn!(id = %handle.id, error = %e, "failed to render inspection");
                }
            }
        }

        let _ = report.record(CleanupStep::Stop, self.stop(handle).await);

        let claimed = self
            .config
            .coverage_dir_abs()
            .and_then(|dir| coverage::claim_coverage_file(&dir, &self.run));
        let _ = report.record(CleanupStep::Coverage, claimed);

        if let Some(logs) = report.record(CleanupStep::Logs, self.text_logs(handle).await) {
            tracing::info!(id = %handle.id, "container logs:\n{logs}");
        }

        let log_path = self.termination_log_path();
        let message = report.record(CleanupStep::TerminationMessage, termination::read(&log_path));
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            tracing::info!(id = %handle.id, "termination message: {message}");
        }
        let _ = report.record(CleanupStep::TerminationLog, termination::remove(&log_path));

        tracing::info!(id = %handle.id, "removing container");
        let options = RemoveOptions {
            force: true,
            volumes: true,
        };
        let removed = match self.engine.remove_container(&handle.id, options).await {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        };
        let _ = report.record(CleanupStep::Remove, removed);

        if report.is_clean() {
            tracing::debug!(id = %handle.id, "cleanup complete");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_error() -> FixtureError {
        FixtureError::Engine {
            operation: "stop_container",
            message: "boom".into(),
        }
    }

    #[test]
    fn empty_report_is_clean() {
        let report = CleanupReport::default();
        assert!(report.is_clean());
        assert!(report.removed());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn diagnostic_failures_do_not_fail_the_result() {
        let mut report = CleanupReport::default();
        assert!(report.record::<()>(CleanupStep::Stop, Err(engine_error())).is_none());
        assert_eq!(report.record(CleanupStep::Logs, Ok(3)), Some(3));

        assert!(!report.is_clean());
        assert!(report.removed());
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].step, CleanupStep::Stop);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn remove_failure_fails_the_result() {
        let mut report = CleanupReport::default();
        let _ = report.record::<()>(CleanupStep::Remove, Err(engine_error()));
        assert!(!report.removed());
        assert!(matches!(
            report.into_result(),
            Err(FixtureError::Engine { .. })
        ));
    }

    #[test]
    fn step_names() {
        assert_eq!(CleanupStep::TerminationLog.to_string(), "termination log");
        assert_eq!(CleanupStep::Remove.to_string(), "remove");
    }
}
