//! Running commands inside fixture containers.

use mqfixture_common::config::ReadyProbe;
use mqfixture_common::error::{FixtureError, Result};
use mqfixture_engine::exec::{ExecOutput, ExecRequest, is_already_running};

use crate::fixture::{ContainerHandle, Fixture};

impl Fixture {
    /// Runs a command in a running container as `user` and returns its exit
    /// code with stdout and stderr combined and trimmed.
    ///
    /// When the engine reports that an exec is already running, the same
    /// request is re-issued after the configured backoff, up to
    /// `exec_retry_limit` attempts in total.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the exec, or
    /// `ExecAlreadyRunning` once the retry limit is used up.
    pub async fn exec<I, S>(
        &self,
        handle: &ContainerHandle,
        user: &str,
        command: I,
    ) -> Result<ExecOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = ExecRequest::new(user, command.into_iter().map(Into::into).collect());
        let limit = self.config.exec_retry_limit.max(1);
        let mut attempt = 1;
        loop {
            match self.exec_once(handle, &request).await {
                Err(err) if err.is_transient() && attempt < limit => {
                    tracing::warn!(
                        id = %handle.id,
                        attempt,
                        error = %err,
                        "exec collided with a running exec, retrying"
                    );
                    tokio::time::sleep(self.config.exec_retry_backoff).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn exec_once(
        &self,
        handle: &ContainerHandle,
        request: &ExecRequest,
    ) -> Result<ExecOutput> {
        let exec = self.engine.create_exec(&handle.id, request).await?;
        let raw = self.engine.start_exec(&exec).await?;

        let exit_code = loop {
            let status = self.engine.inspect_exec(&exec).await?;
            if !status.running {
                break status.exit_code.unwrap_or(-1);
            }
            tokio::time::sleep(self.config.exec_poll_interval).await;
        };

        let output = String::from_utf8_lossy(&raw).trim().to_string();
        // the daemon sometimes reports the collision in-band
        if is_already_running(&output) {
            return Err(FixtureError::ExecAlreadyRunning { message: output });
        }
        tracing::debug!(
            id = %handle.id,
            exec = %exec,
            cmd = ?request.command,
            exit_code,
            "exec finished"
        );
        Ok(ExecOutput { exit_code, output })
    }

    /// Polls the configured readiness probe until it exits with 0.
    ///
    /// # Errors
    ///
    /// Returns an error if an exec fails or the probe's timeout elapses.
    pub async fn wait_ready(&self, handle: &ContainerHandle) -> Result<()> {
        let probe = self.config.ready_probe.clone();
        self.wait_ready_with(handle, &probe).await
    }

    /// Polls `probe` until it exits with 0, sleeping `poll_interval` after
    /// each failed attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if an exec fails or the probe's timeout elapses.
    pub async fn wait_ready_with(
        &self,
        handle: &ContainerHandle,
        probe: &ReadyProbe,
    ) -> Result<()> {
        let poll = async {
            let mut attempts: u32 = 0;
            loop {
                attempts += 1;
                let out = self
                    .exec(handle, &probe.user, probe.command.iter().cloned())
                    .await?;
                if out.exit_code == 0 {
                    tracing::info!(id = %handle.id, attempts, "container is ready");
                    return Ok::<(), FixtureError>(());
                }
                tracing::debug!(
                    id = %handle.id,
                    attempts,
                    exit_code = out.exit_code,
                    "not ready yet"
                );
                tokio::time::sleep(probe.poll_interval).await;
            }
        };

        match probe.timeout {
            Some(limit) => tokio::time::timeout(limit, poll)
                .await
                .unwrap_or(Err(FixtureError::Timeout {
                    operation: "wait_ready",
                    after: limit,
                })),
            None => poll.await,
        }
    }
}
