//! Networks, volumes, images and container introspection.

use mqfixture_common::constants::WEB_PORT;
use mqfixture_common::error::{FixtureError, Result};
use mqfixture_common::types::NetworkId;
use mqfixture_engine::backend::VolumeInfo;

use crate::fixture::{ContainerHandle, Fixture};

impl Fixture {
    /// Creates a network named after the test.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot create the network.
    pub async fn create_network(&self) -> Result<NetworkId> {
        let name = self.run.network_name();
        let id = self.engine.create_network(name).await?;
        tracing::info!(name, id = %id, "network created");
        Ok(id)
    }

    /// Removes a network.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot remove the network.
    pub async fn remove_network(&self, id: &NetworkId) -> Result<()> {
        tracing::info!(id = %id, "removing network");
        self.engine.remove_network(id).await
    }

    /// Creates a local volume named after the test.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot create the volume.
    pub async fn create_volume(&self) -> Result<VolumeInfo> {
        let volume = self.engine.create_volume(self.run.volume_name()).await?;
        tracing::info!(
            name = %volume.name,
            mountpoint = %volume.mountpoint,
            "volume created"
        );
        Ok(volume)
    }

    /// Removes a volume, even if a stopped container still references it.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot remove the volume.
    pub async fn remove_volume(&self, name: &str) -> Result<()> {
        tracing::info!(name, "removing volume");
        self.engine.remove_volume(name, true).await
    }

    /// Force-removes an image. Failures are logged and otherwise ignored.
    pub async fn remove_image(&self, tag: &str) {
        match self.engine.remove_image(tag, true).await {
            Ok(()) => tracing::info!(tag, "image removed"),
            Err(err) => tracing::warn!(tag, error = %err, "failed to remove image"),
        }
    }

    /// Returns a tar archive of `path` inside the container.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist in the container.
    pub async fn copy_from_container(
        &self,
        handle: &ContainerHandle,
        path: &str,
    ) -> Result<Vec<u8>> {
        self.engine.copy_from_container(&handle.id, path).await
    }

    /// Returns the container's address on the default network.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is unknown or has no address.
    pub async fn ip_address(&self, handle: &ContainerHandle) -> Result<String> {
        let details = self.engine.inspect_container(&handle.id).await?;
        details
            .ip_address
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| FixtureError::NotFound {
                kind: "container address",
                id: handle.id.to_string(),
            })
    }

    /// Returns the host port bound to the web console port.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is unknown, the port is not
    /// published, or the engine reports an invalid port.
    pub async fn web_port(&self, handle: &ContainerHandle) -> Result<u16> {
        let details = self.engine.inspect_container(&handle.id).await?;
        let port = details
            .ports
            .get(WEB_PORT)
            .into_iter()
            .flatten()
            .find_map(|binding| binding.host_port.as_deref())
            .filter(|port| !port.is_empty())
            .ok_or_else(|| FixtureError::NotFound {
                kind: "web port binding",
                id: handle.id.to_string(),
            })?;
        port.parse().map_err(|_| FixtureError::Engine {
            operation: "inspect_container",
            message: format!("invalid host port {port:?} for {WEB_PORT}"),
        })
    }
}
