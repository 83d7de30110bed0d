//! Termination-log file handling.
//!
//! The container writes its final diagnostic to `/dev/termination-log`.
//! Files under `/dev` cannot be copied out of a container, so the path is
//! bind-mounted from a host file instead, and a bind mount needs its source
//! to exist before the container is created.

use std::fs::OpenOptions;
use std::io::ErrorKind;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use mqfixture_common::error::{FixtureError, Result};

use crate::fixture::Fixture;

/// Recreates the termination-log file empty.
///
/// # Errors
///
/// Returns an error if a stale file cannot be removed or the new one
/// cannot be created.
pub fn prepare(path: &Path) -> Result<()> {
    remove(path)?;
    let mut options = OpenOptions::new();
    let _ = options.write(true).create(true);
    #[cfg(unix)]
    let _ = options.mode(mqfixture_common::constants::TERMINATION_LOG_MODE);
    let _file = options.open(path).map_err(|e| FixtureError::io(path, e))?;
    tracing::debug!(path = %path.display(), "termination log prepared");
    Ok(())
}

/// Reads the termination message. An empty file yields an empty string.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| FixtureError::io(path, e))
}

/// Deletes the termination-log file. A missing file is not an error.
///
/// # Errors
///
/// Returns an error if an existing file cannot be deleted.
pub fn remove(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FixtureError::io(path, e)),
    }
}

impl Fixture {
    /// Returns the termination message written by this test's container,
    /// or an empty string if there is none or it cannot be read.
    #[must_use]
    pub fn termination_message(&self) -> String {
        read(&self.termination_log_path()).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to read termination message");
            String::new()
        })
    }

    /// Returns the termination message, failing if none was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the termination message is empty.
    pub fn expect_termination_message(&self) -> Result<String> {
        let message = self.termination_message();
        if message.is_empty() {
            return Err(FixtureError::NotFound {
                kind: "termination message",
                id: self.termination_log_path().display().to_string(),
            });
        }
        Ok(message)
    }
}
