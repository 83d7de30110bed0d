//! Engine abstraction the fixture controller is written against.

pub mod docker;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use mqfixture_common::error::Result;
use mqfixture_common::types::{ContainerId, ContainerState, ExecId, NetworkId};

use crate::exec::{ExecRequest, ExecStatus};

/// Host-side publication of a container port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRequest {
    /// Container port with protocol, e.g. `9443/tcp`.
    pub container_port: String,
    /// Host address to bind.
    pub host_ip: String,
    /// Host port. `None` lets the engine assign one.
    pub host_port: Option<String>,
}

/// Everything needed to create a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateRequest {
    /// Container name.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Entrypoint override.
    pub entrypoint: Option<Vec<String>>,
    /// Command override.
    pub command: Option<Vec<String>>,
    /// Environment in `KEY=value` form.
    pub env: Vec<String>,
    /// Bind mounts in `host:container` form.
    pub binds: Vec<String>,
    /// Ports to publish.
    pub ports: Vec<PortRequest>,
    /// Network to attach to.
    pub network: Option<String>,
}

/// How to remove a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Kill the container first if it is running.
    pub force: bool,
    /// Remove anonymous volumes created with the container.
    pub volumes: bool,
}

/// A host binding of a published port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBinding {
    /// Host address.
    pub host_ip: Option<String>,
    /// Host port.
    pub host_port: Option<String>,
}

/// Subset of the engine's container inspection the harness relies on.
#[derive(Debug, Clone)]
pub struct ContainerDetails {
    /// Container identifier.
    pub id: ContainerId,
    /// Container name as reported by the engine.
    pub name: String,
    /// Current lifecycle state.
    pub state: ContainerState,
    /// Exit code, once the container has exited.
    pub exit_code: Option<i64>,
    /// Address on the default bridge network.
    pub ip_address: Option<String>,
    /// Published ports keyed by container port.
    pub ports: BTreeMap<String, Vec<HostBinding>>,
    /// Full inspection document, for diagnostics.
    pub raw: serde_json::Value,
}

/// One progress message from an image build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMessage {
    /// Build step output.
    pub stream: Option<String>,
    /// Error reported by the build.
    pub error: Option<String>,
}

/// A created volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    /// Volume name.
    pub name: String,
    /// Volume driver.
    pub driver: String,
    /// Host mount point.
    pub mountpoint: String,
}

/// Remote container engine.
///
/// Implementors translate these calls into the engine's own API and map
/// its failures onto [`FixtureError`](mqfixture_common::error::FixtureError):
/// unknown resources become `NotFound`, an exec rejected because a previous
/// one is still running becomes `ExecAlreadyRunning`.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Creates a container and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the configuration.
    async fn create_container(&self, request: &CreateRequest) -> Result<ContainerId>;

    /// Starts a created container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be started.
    async fn start_container(&self, id: &ContainerId) -> Result<()>;

    /// Stops a container, killing it after `grace`. Stopping an already
    /// stopped container succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be stopped.
    async fn stop_container(&self, id: &ContainerId, grace: Duration) -> Result<()>;

    /// Removes a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be removed.
    async fn remove_container(&self, id: &ContainerId, options: RemoveOptions) -> Result<()>;

    /// Inspects a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is unknown.
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerDetails>;

    /// Blocks until the container exits and returns its exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait cannot be established.
    async fn wait_container(&self, id: &ContainerId) -> Result<i64>;

    /// Returns the container's stdout and stderr, demultiplexed and
    /// interleaved in arrival order.
    ///
    /// # Errors
    ///
    /// Returns an error if the logs cannot be retrieved.
    async fn container_logs(&self, id: &ContainerId) -> Result<Vec<u8>>;

    /// Creates an exec session inside a running container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running.
    async fn create_exec(&self, id: &ContainerId, request: &ExecRequest) -> Result<ExecId>;

    /// Starts an exec session attached to its output and returns the
    /// combined, demultiplexed stdout and stderr once the stream closes.
    ///
    /// # Errors
    ///
    /// Returns `ExecAlreadyRunning` if the engine reports the session busy.
    async fn start_exec(&self, exec: &ExecId) -> Result<Vec<u8>>;

    /// Reports whether an exec session is still running and its exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown.
    async fn inspect_exec(&self, exec: &ExecId) -> Result<ExecStatus>;

    /// Builds an image from a tar build context, streaming progress.
    fn build_image(&self, tag: &str, context: Vec<u8>) -> BoxStream<'_, Result<BuildMessage>>;

    /// Removes an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be removed.
    async fn remove_image(&self, tag: &str, force: bool) -> Result<()>;

    /// Creates a network and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the network cannot be created.
    async fn create_network(&self, name: &str) -> Result<NetworkId>;

    /// Removes a network.
    ///
    /// # Errors
    ///
    /// Returns an error if the network cannot be removed.
    async fn remove_network(&self, id: &NetworkId) -> Result<()>;

    /// Creates a volume with the local driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume cannot be created.
    async fn create_volume(&self, name: &str) -> Result<VolumeInfo>;

    /// Removes a volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume cannot be removed.
    async fn remove_volume(&self, name: &str, force: bool) -> Result<()>;

    /// Returns a tar archive of `path` inside the container.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist.
    async fn copy_from_container(&self, id: &ContainerId, path: &str) -> Result<Vec<u8>>;
}
