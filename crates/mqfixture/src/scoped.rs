//! Scoped container helpers that always clean up.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use mqfixture_common::error::{FixtureError, Result};

use crate::fixture::{ContainerHandle, Fixture};
use crate::spec::ContainerSpec;

impl Fixture {
    /// Creates and starts a container, runs `body` against it, then stops
    /// and removes it.
    ///
    /// Cleanup runs whether `body` returns `Ok`, returns `Err` or panics.
    /// A panic is resumed once cleanup is done.
    ///
    /// # Errors
    ///
    /// Returns the error of `body` if it failed, otherwise an error if the
    /// container could not be started or removed.
    pub async fn with_container<T, F>(&self, spec: ContainerSpec, body: F) -> Result<T>
    where
        F: AsyncFnOnce(&Self, &ContainerHandle) -> Result<T>,
    {
        let handle = self.create_and_start(spec).await?;
        let outcome = AssertUnwindSafe(body(self, &handle)).catch_unwind().await;
        let report = self.stop_and_remove(&handle).await;

        match outcome {
            Err(panic) => std::panic::resume_unwind(panic),
            Ok(Err(err)) => Err(err),
            Ok(Ok(value)) => {
                report.into_result()?;
                Ok(value)
            }
        }
    }

    /// Runs a container with its entrypoint replaced, waits for it to exit
    /// and returns the exit code with the raw logs.
    ///
    /// The container is stopped and removed on every path.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be started, does not exit
    /// within `timeout`, or its logs cannot be read.
    pub async fn run_one_shot<I, S>(
        &self,
        entrypoint: I,
        timeout: Option<Duration>,
    ) -> Result<(i64, String)>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = ContainerSpec::new().entrypoint(entrypoint);
        let handle = self.create_and_start(spec).await?;

        let result = async {
            let code = self.wait_exit(&handle, timeout).await?;
            let logs = self.logs(&handle).await?;
            Ok::<_, FixtureError>((code, logs))
        }
        .await;

        let report = self.stop_and_remove(&handle).await;
        let (code, logs) = result?;
        report.into_result()?;
        Ok((code, logs))
    }
}
