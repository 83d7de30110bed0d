//! Fixture controller: container creation, start, stop and exit.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mqfixture_common::config::FixtureConfig;
use mqfixture_common::constants::{
    CONTAINER_COVERAGE_DIR, CONTAINER_TERMINATION_LOG, ENV_COVERAGE_FILE, WEB_PORT,
    WEB_PORT_HOST_IP,
};
use mqfixture_common::error::{FixtureError, Result};
use mqfixture_common::types::{ContainerId, TestRun};
use mqfixture_engine::Engine;
use mqfixture_engine::backend::docker::DockerEngine;
use mqfixture_engine::backend::{CreateRequest, PortRequest, RemoveOptions};

use crate::spec::ContainerSpec;
use crate::{coverage, termination};

/// A container created by a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    /// Engine-assigned identifier.
    pub id: ContainerId,
    /// Name the container was created with.
    pub name: String,
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Lifecycle controller for the containers of one test.
///
/// A fixture is cheap to build and owns no container by itself; every
/// [`ContainerHandle`] it returns must be passed to
/// [`stop_and_remove`](Self::stop_and_remove), or created through
/// [`with_container`](Self::with_container) which does so on every path.
pub struct Fixture {
    pub(crate) engine: Arc<dyn Engine>,
    pub(crate) config: FixtureConfig,
    pub(crate) run: TestRun,
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("config", &self.config)
            .field("run", &self.run)
            .finish_non_exhaustive()
    }
}

impl Fixture {
    /// Creates a fixture over the given engine.
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, config: FixtureConfig, run: TestRun) -> Self {
        Self {
            engine,
            config,
            run,
        }
    }

    /// Creates a fixture talking to the local Docker daemon.
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon connection settings are invalid.
    pub fn connect(config: FixtureConfig, run: TestRun) -> Result<Self> {
        let engine = DockerEngine::connect()?;
        Ok(Self::new(Arc::new(engine), config, run))
    }

    /// Returns the engine the fixture drives.
    #[must_use]
    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// Returns the fixture configuration.
    #[must_use]
    pub const fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// Returns the test run the fixture belongs to.
    #[must_use]
    pub const fn run(&self) -> &TestRun {
        &self.run
    }

    /// Host path of this test's termination-log file.
    #[must_use]
    pub fn termination_log_path(&self) -> PathBuf {
        self.run.termination_log_path(&self.config.termination_log_dir)
    }

    /// Creates and starts a container.
    ///
    /// The container gets the coverage directory and the termination log
    /// bind-mounted, `COVERAGE_FILE` naming this test's coverage output,
    /// and an engine-assigned host port for the web console. The
    /// termination-log file is recreated empty before the container is
    /// created. If create or start fails, the container and the termination
    /// log are removed again.
    ///
    /// # Errors
    ///
    /// Returns an error if the host-side files cannot be prepared or the
    /// engine rejects creation or start.
    pub async fn create_and_start(&self, spec: ContainerSpec) -> Result<ContainerHandle> {
        let request = self.create_request(spec)?;
        tracing::info!(name = %request.name, image = %request.image, "running container");
        let id = match self.engine.create_container(&request).await {
            Ok(id) => id,
            Err(err) => {
                self.discard_termination_log();
                return Err(err);
            }
        };
        tracing::info!(id = %id, name = %request.name, "container created");

        let handle = ContainerHandle {
            id,
            name: request.name,
        };
        if let Err(err) = self.start(&handle).await {
            let options = RemoveOptions {
                force: true,
                volumes: true,
            };
            if let Err(remove_err) = self.engine.remove_container(&handle.id, options).await {
                tracing::warn!(
                    id = %handle.id,
                    error = %remove_err,
                    "failed to remove unstarted container"
                );
            }
            self.discard_termination_log();
            return Err(err);
        }
        Ok(handle)
    }

    fn discard_termination_log(&self) {
        if let Err(err) = termination::remove(&self.termination_log_path()) {
            tracing::warn!(error = %err, "failed to remove termination log");
        }
    }

    /// Translates a spec into an engine request, preparing the host side
    /// of the bind mounts on the way.
    pub(crate) fn create_request(&self, spec: ContainerSpec) -> Result<CreateRequest> {
        let coverage_dir = self.config.coverage_dir_abs()?;
        coverage::ensure_dir(&coverage_dir)?;
        let log_path = self.termination_log_path();
        termination::prepare(&log_path)?;

        let mut env = spec.env;
        env.push(format!("{ENV_COVERAGE_FILE}={}", self.run.coverage_file_name()));

        let mut binds = vec![
            format!("{}:{CONTAINER_COVERAGE_DIR}", coverage_dir.display()),
            format!("{}:{CONTAINER_TERMINATION_LOG}", log_path.display()),
        ];
        binds.extend(spec.mounts);

        Ok(CreateRequest {
            name: spec
                .name
                .unwrap_or_else(|| self.run.container_name().to_string()),
            image: spec.image.unwrap_or_else(|| self.config.image.clone()),
            entrypoint: spec.entrypoint,
            command: spec.command,
            env,
            binds,
            ports: vec![PortRequest {
                container_port: WEB_PORT.to_string(),
                host_ip: WEB_PORT_HOST_IP.to_string(),
                host_port: None,
            }],
            network: spec.network,
        })
    }

    /// Starts a created container.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the start.
    pub async fn start(&self, handle: &ContainerHandle) -> Result<()> {
        tracing::info!(id = %handle.id, "starting container");
        self.engine.start_container(&handle.id).await
    }

    /// Stops a container within the configured grace period.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot stop the container.
    pub async fn stop(&self, handle: &ContainerHandle) -> Result<()> {
        tracing::info!(id = %handle.id, "stopping container");
        self.engine
            .stop_container(&handle.id, self.config.stop_grace)
            .await
    }

    /// Waits for a container to exit and returns its exit code.
    ///
    /// With coverage enabled, an `exitCode` file in the coverage directory
    /// takes precedence over the engine's code and is deleted once read.
    /// A timed-out wait leaves the file alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails or exceeds `timeout`.
    pub async fn wait_exit(
        &self,
        handle: &ContainerHandle,
        timeout: Option<Duration>,
    ) -> Result<i64> {
        let coverage_dir = self.config.coverage_dir_abs()?;
        let waited = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.engine.wait_container(&handle.id))
                .await
                .unwrap_or(Err(FixtureError::Timeout {
                    operation: "wait_exit",
                    after: limit,
                })),
            None => self.engine.wait_container(&handle.id).await,
        };
        if matches!(waited, Err(FixtureError::Timeout { .. })) {
            return waited;
        }

        let overridden = if self.config.coverage {
            coverage::take_exit_code(&coverage_dir)
        } else {
            None
        };
        let code = waited?;
        tracing::info!(id = %handle.id, code, ?overridden, "container exited");
        Ok(overridden.unwrap_or(code))
    }
}
