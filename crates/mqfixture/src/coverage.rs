//! Coverage artifacts produced inside the bind-mounted coverage directory.
//!
//! An instrumented server writes `container.cov` on shutdown. Because the
//! instrumentation swallows non-zero exits, it also writes the real exit
//! status to `exitCode`.

use std::io::ErrorKind;
use std::path::Path;

use mqfixture_common::constants::{CONTAINER_COVERAGE_FILE, COVERAGE_EXIT_CODE_FILE};
use mqfixture_common::error::{FixtureError, Result};
use mqfixture_common::types::TestRun;

/// Creates the coverage directory if it does not exist yet.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| FixtureError::io(dir, e))
}

/// Reads and deletes the coverage exit-code file.
///
/// Returns `None` when the file is absent, unreadable or does not hold an
/// integer. The file is deleted whenever it existed, so a later container
/// never picks up a stale code.
#[must_use]
pub fn take_exit_code(dir: &Path) -> Option<i64> {
    let path = dir.join(COVERAGE_EXIT_CODE_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no coverage exit code");
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read coverage exit code");
            discard(&path);
            return None;
        }
    };
    discard(&path);

    match content.trim().parse::<i64>() {
        Ok(code) => {
            tracing::info!(code, "retrieved exit code from coverage file");
            Some(code)
        }
        Err(e) => {
            tracing::warn!(content = %content.trim(), error = %e, "invalid coverage exit code");
            None
        }
    }
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove coverage exit code");
    }
}

/// Renames the container's coverage output after the test.
///
/// Returns whether a coverage file was present.
///
/// # Errors
///
/// Returns an error if an existing file cannot be renamed.
pub fn claim_coverage_file(dir: &Path, run: &TestRun) -> Result<bool> {
    let from = dir.join(CONTAINER_COVERAGE_FILE);
    let to = dir.join(run.coverage_file_name());
    match std::fs::rename(&from, &to) {
        Ok(()) => {
            tracing::info!(path = %to.display(), "coverage file saved");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FixtureError::io(from, e)),
    }
}
