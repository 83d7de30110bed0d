//! Container log capture.

use mqfixture_common::error::{FixtureError, Result};

use crate::fixture::{ContainerHandle, Fixture};

impl Fixture {
    /// Returns the container's combined stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns an error if the logs cannot be read within the configured
    /// log timeout.
    pub async fn logs(&self, handle: &ContainerHandle) -> Result<String> {
        let limit = self.config.log_timeout;
        let raw = tokio::time::timeout(limit, self.engine.container_logs(&handle.id))
            .await
            .map_err(|_| FixtureError::Timeout {
                operation: "container_logs",
                after: limit,
            })??;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Returns the container's logs with JSON lines reduced to their
    /// message, for readable test output.
    ///
    /// # Errors
    ///
    /// Returns an error if the logs cannot be read.
    pub async fn text_logs(&self, handle: &ContainerHandle) -> Result<String> {
        let raw = self.logs(handle).await?;
        Ok(reduce_json_lines(&raw))
    }
}

/// Rewrites every JSON log line carrying a `message` field as
/// `{"message": "<message>"}`. Other lines are kept as they are. Every
/// output line ends with a newline.
#[must_use]
pub fn reduce_json_lines(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for line in raw.lines() {
        match json_message(line) {
            Some(message) => {
                out.push_str("{\"message\": \"");
                out.push_str(&message);
                out.push_str("\"}");
            }
            None => out.push_str(line),
        }
        out.push('\n');
    }
    out
}

fn json_message(line: &str) -> Option<String> {
    if !line.trim_start().starts_with('{') {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    match value.get("message")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
