//! Configuration model for the fixture controller.
//!
//! The configuration is built once, usually with [`FixtureConfig::from_env`],
//! and passed explicitly to every fixture. Nothing else in the workspace
//! reads the process environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{FixtureError, Result};

/// Readiness probe executed inside a started container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadyProbe {
    /// User the probe runs as.
    pub user: String,
    /// Probe command and arguments.
    pub command: Vec<String>,
    /// Pause between failed probes.
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,
    /// Give up after this long. `None` polls until the probe succeeds.
    #[serde(rename = "timeout_ms", with = "millis::option")]
    pub timeout: Option<Duration>,
}

impl Default for ReadyProbe {
    fn default() -> Self {
        Self {
            user: constants::READY_PROBE_USER.to_string(),
            command: vec![constants::READY_PROBE_COMMAND.to_string()],
            poll_interval: constants::READY_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// Root configuration for fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Image used when a container spec names none.
    pub image: String,
    /// Whether the coverage exit-code override is honored.
    pub coverage: bool,
    /// Host directory bind-mounted for coverage output.
    pub coverage_dir: PathBuf,
    /// Host directory holding termination-log files.
    pub termination_log_dir: PathBuf,
    /// Grace period on stop.
    #[serde(rename = "stop_grace_ms", with = "millis")]
    pub stop_grace: Duration,
    /// Bound on log retrieval.
    #[serde(rename = "log_timeout_ms", with = "millis")]
    pub log_timeout: Duration,
    /// Pause between exec-inspect polls.
    #[serde(rename = "exec_poll_interval_ms", with = "millis")]
    pub exec_poll_interval: Duration,
    /// Pause before retrying an exec reported as already running.
    #[serde(rename = "exec_retry_backoff_ms", with = "millis")]
    pub exec_retry_backoff: Duration,
    /// Maximum attempts per exec while the engine reports it busy.
    pub exec_retry_limit: u32,
    /// Probe used by `wait_ready`.
    pub ready_probe: ReadyProbe,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            image: constants::DEFAULT_IMAGE.to_string(),
            coverage: false,
            coverage_dir: PathBuf::from(constants::DEFAULT_COVERAGE_DIR),
            termination_log_dir: PathBuf::from(constants::DEFAULT_TERMINATION_LOG_DIR),
            stop_grace: constants::STOP_GRACE,
            log_timeout: constants::LOG_TIMEOUT,
            exec_poll_interval: constants::EXEC_POLL_INTERVAL,
            exec_retry_backoff: constants::EXEC_RETRY_BACKOFF,
            exec_retry_limit: constants::EXEC_RETRY_LIMIT,
            ready_probe: ReadyProbe::default(),
        }
    }
}

impl FixtureConfig {
    /// Builds a configuration from `TEST_IMAGE` and `TEST_COVER`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// `TEST_IMAGE` replaces the default image when set. `TEST_COVER`
    /// enables coverage only for the exact values `true` and `1`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(image) = lookup(constants::ENV_TEST_IMAGE) {
            config.image = image;
        }
        config.coverage = lookup(constants::ENV_TEST_COVER).is_some_and(|v| parse_flag(&v));
        config
    }

    /// Loads a configuration from a JSON file. Missing fields take defaults.
    ///
    /// Durations are written in milliseconds, under field names ending in
    /// `_ms`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result fails [`FixtureConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FixtureError::io(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that would leave a fixture unable to work.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Config`] if the image is empty, the readiness
    /// command is empty, or the exec retry limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.image.trim().is_empty() {
            return Err(FixtureError::Config {
                message: "image must not be empty".into(),
            });
        }
        if self.ready_probe.command.first().is_none_or(String::is_empty) {
            return Err(FixtureError::Config {
                message: "ready_probe.command must name a program".into(),
            });
        }
        if self.exec_retry_limit == 0 {
            return Err(FixtureError::Config {
                message: "exec_retry_limit must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Returns the coverage directory as an absolute path, resolving a
    /// relative one against the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined.
    pub fn coverage_dir_abs(&self) -> Result<PathBuf> {
        if self.coverage_dir.is_absolute() {
            return Ok(self.coverage_dir.clone());
        }
        let cwd = std::env::current_dir().map_err(|e| FixtureError::io(".", e))?;
        Ok(cwd.join(&self.coverage_dir))
    }
}

fn parse_flag(value: &str) -> bool {
    value == "true" || value == "1"
}

/// Serde adapter writing a [`Duration`] as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }

    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(duration) => super::serialize(duration, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
        }
    }
}
