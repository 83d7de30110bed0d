//! Unified error type for the mqfixture workspace.
//!
//! Engine failures, filesystem failures around the bind-mounted artifacts,
//! and fixture-level conditions (timeouts, build failures) all surface as
//! [`FixtureError`]. Whether an error aborts a test or is merely logged is a
//! decision of the caller, not of the variant.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The container engine rejected a request.
    #[error("engine {operation} failed: {message}")]
    Engine {
        /// Engine operation that failed, e.g. `create_container`.
        operation: &'static str,
        /// Error text reported by the engine.
        message: String,
    },

    /// The engine refused to start an exec because a previous one is still
    /// finishing. Retrying after a short pause normally succeeds.
    #[error("exec already running: {message}")]
    ExecAlreadyRunning {
        /// Error text reported by the engine.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// An image build reported an error.
    #[error("image build failed: {message}")]
    Build {
        /// Error message from the build output.
        message: String,
    },

    /// A bounded wait ran out of time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
        /// The bound that was exceeded.
        after: Duration,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl FixtureError {
    /// Builds an [`FixtureError::Io`] from a path and the failing I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns whether the error reflects an engine race that clears up on
    /// its own, as opposed to a broken fixture.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ExecAlreadyRunning { .. })
    }

    /// Returns whether the error means the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, FixtureError>;
