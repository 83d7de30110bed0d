//! Fixed names and paths shared by the harness and the image under test.

use std::time::Duration;

/// Image used when neither the test nor `TEST_IMAGE` names one.
pub const DEFAULT_IMAGE: &str = "mq-devserver:latest-x86-64";

/// Environment variable overriding the default image.
pub const ENV_TEST_IMAGE: &str = "TEST_IMAGE";

/// Environment variable enabling the coverage exit-code override.
pub const ENV_TEST_COVER: &str = "TEST_COVER";

/// Host directory for coverage data, relative to the working directory.
pub const DEFAULT_COVERAGE_DIR: &str = "coverage";

/// Mount point of the coverage directory inside the container.
pub const CONTAINER_COVERAGE_DIR: &str = "/var/coverage";

/// Coverage file the instrumented binary writes inside the coverage mount.
pub const CONTAINER_COVERAGE_FILE: &str = "container.cov";

/// File holding the real exit code when coverage instrumentation is active.
pub const COVERAGE_EXIT_CODE_FILE: &str = "exitCode";

/// Environment variable handed to the container naming its coverage output.
pub const ENV_COVERAGE_FILE: &str = "COVERAGE_FILE";

/// Host directory holding termination-log files. Must be visible to the
/// engine daemon for the bind mount to work.
pub const DEFAULT_TERMINATION_LOG_DIR: &str = "/tmp";

/// Suffix appended to the test name to form the termination-log file name.
pub const TERMINATION_LOG_SUFFIX: &str = "-termination-log";

/// Termination-log location inside the container.
pub const CONTAINER_TERMINATION_LOG: &str = "/dev/termination-log";

/// Internal port of the messaging server's web console.
pub const WEB_PORT: &str = "9443/tcp";

/// Host address the web port is published on.
pub const WEB_PORT_HOST_IP: &str = "0.0.0.0";

/// User the readiness probe runs as.
pub const READY_PROBE_USER: &str = "mqm";

/// Readiness probe command.
pub const READY_PROBE_COMMAND: &str = "chkmqready";

/// Grace period given to a container on stop before it is killed.
pub const STOP_GRACE: Duration = Duration::from_secs(10);

/// Upper bound on retrieving container logs.
pub const LOG_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause before re-issuing an exec the engine reported as already running.
pub const EXEC_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum attempts for a single exec while the engine reports it busy.
pub const EXEC_RETRY_LIMIT: u32 = 10;

/// Interval between exec-inspect polls.
pub const EXEC_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Interval between readiness probes.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Unix mode of every entry in a generated build context.
pub const BUILD_CONTEXT_FILE_MODE: u32 = 0o600;

/// Mode of the termination-log file created on the host.
pub const TERMINATION_LOG_MODE: u32 = 0o600;
