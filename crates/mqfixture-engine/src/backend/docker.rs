//! Docker Engine API backend built on `bollard`.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, DownloadFromContainerOptions, InspectContainerOptions,
    LogsOptions, RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
    WaitContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::image::{BuildImageOptions, RemoveImageOptions};
use bollard::models::{
    BuildInfo, ContainerInspectResponse, ContainerStateStatusEnum, HostConfig,
    NetworkCreateResponse, PortBinding,
};
use bollard::network::CreateNetworkOptions;
use bollard::volume::{CreateVolumeOptions, RemoveVolumeOptions};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use mqfixture_common::error::{FixtureError, Result};
use mqfixture_common::types::{ContainerId, ContainerState, ExecId, NetworkId};

use super::{
    BuildMessage, ContainerDetails, CreateRequest, Engine, HostBinding, RemoveOptions, VolumeInfo,
};
use crate::exec::{ExecRequest, ExecStatus, is_already_running_message};

/// Engine backed by a Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connects to the local daemon using `DOCKER_HOST` or the platform's
    /// default socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection settings are invalid.
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(|e| FixtureError::Engine {
            operation: "connect",
            message: e.to_string(),
        })?;
        Ok(Self { docker })
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn from_client(docker: Docker) -> Self {
        Self { docker }
    }
}

/// Maps a daemon error onto the workspace error type.
fn map_error(
    operation: &'static str,
    kind: &'static str,
    id: &str,
    err: DockerError,
) -> FixtureError {
    match err {
        DockerError::DockerResponseServerError {
            status_code: 404, ..
        } => FixtureError::NotFound {
            kind,
            id: id.to_string(),
        },
        DockerError::DockerResponseServerError { message, .. }
            if is_already_running_message(&message) =>
        {
            FixtureError::ExecAlreadyRunning { message }
        }
        other => FixtureError::Engine {
            operation,
            message: other.to_string(),
        },
    }
}

const fn map_status(status: &ContainerStateStatusEnum) -> ContainerState {
    match status {
        ContainerStateStatusEnum::CREATED => ContainerState::Created,
        ContainerStateStatusEnum::RUNNING => ContainerState::Running,
        ContainerStateStatusEnum::PAUSED => ContainerState::Paused,
        ContainerStateStatusEnum::RESTARTING => ContainerState::Restarting,
        ContainerStateStatusEnum::REMOVING => ContainerState::Removing,
        ContainerStateStatusEnum::EXITED => ContainerState::Exited,
        ContainerStateStatusEnum::DEAD => ContainerState::Dead,
        ContainerStateStatusEnum::EMPTY => ContainerState::Unknown,
    }
}

fn details_from(id: &ContainerId, response: ContainerInspectResponse) -> Result<ContainerDetails> {
    let raw = serde_json::to_value(&response)?;
    let state = response
        .state
        .as_ref()
        .and_then(|s| s.status.as_ref())
        .map_or(ContainerState::Unknown, map_status);
    let exit_code = response.state.as_ref().and_then(|s| s.exit_code);
    let settings = response.network_settings.unwrap_or_default();
    let ports = settings
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|(port, bindings)| {
            let bindings = bindings
                .unwrap_or_default()
                .into_iter()
                .map(|b| HostBinding {
                    host_ip: b.host_ip,
                    host_port: b.host_port,
                })
                .collect();
            (port, bindings)
        })
        .collect::<BTreeMap<_, _>>();

    Ok(ContainerDetails {
        id: response.id.map_or_else(|| id.clone(), ContainerId::new),
        name: response
            .name
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default(),
        state,
        exit_code,
        ip_address: settings.ip_address.filter(|ip| !ip.is_empty()),
        ports,
        raw,
    })
}

fn network_id_from(name: &str, response: NetworkCreateResponse) -> Result<NetworkId> {
    if let Some(warning) = response.warning.filter(|w| !w.is_empty()) {
        tracing::warn!(network = %name, %warning, "engine warning on network create");
    }
    response
        .id
        .filter(|id| !id.is_empty())
        .map(NetworkId::new)
        .ok_or_else(|| FixtureError::Engine {
            operation: "create_network",
            message: format!("no id returned for network {name}"),
        })
}

fn build_message(info: BuildInfo) -> BuildMessage {
    let error = info
        .error
        .or_else(|| info.error_detail.and_then(|detail| detail.message));
    BuildMessage {
        stream: info.stream,
        error,
    }
}

#[async_trait]
impl Engine for DockerEngine {
    async fn create_container(&self, request: &CreateRequest) -> Result<ContainerId> {
        let mut exposed_ports = HashMap::new();
        let mut port_bindings = HashMap::new();
        for port in &request.ports {
            let _ = exposed_ports.insert(port.container_port.clone(), HashMap::new());
            let _ = port_bindings.insert(
                port.container_port.clone(),
                Some(vec![PortBinding {
                    host_ip: Some(port.host_ip.clone()),
                    host_port: port.host_port.clone(),
                }]),
            );
        }

        let host_config = HostConfig {
            binds: Some(request.binds.clone()),
            port_bindings: Some(port_bindings),
            network_mode: request.network.clone(),
            ..Default::default()
        };
        let config = Config {
            image: Some(request.image.clone()),
            entrypoint: request.entrypoint.clone(),
            cmd: request.command.clone(),
            env: Some(request.env.clone()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };
        let options = CreateContainerOptions {
            name: request.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| map_error("create_container", "image", &request.image, e))?;
        for warning in &response.warnings {
            tracing::warn!(name = %request.name, %warning, "engine warning on create");
        }
        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<()> {
        self.docker
            .start_container(id.as_str(), None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| map_error("start_container", "container", id.as_str(), e))
    }

    async fn stop_container(&self, id: &ContainerId, grace: Duration) -> Result<()> {
        let options = StopContainerOptions {
            t: i64::try_from(grace.as_secs()).unwrap_or(i64::MAX),
        };
        match self.docker.stop_container(id.as_str(), Some(options)).await {
            Ok(()) => Ok(()),
            // 304: already stopped
            Err(DockerError::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(()),
            Err(e) => Err(map_error("stop_container", "container", id.as_str(), e)),
        }
    }

    async fn remove_container(&self, id: &ContainerId, options: RemoveOptions) -> Result<()> {
        let options = RemoveContainerOptions {
            v: options.volumes,
            force: options.force,
            ..Default::default()
        };
        self.docker
            .remove_container(id.as_str(), Some(options))
            .await
            .map_err(|e| map_error("remove_container", "container", id.as_str(), e))
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerDetails> {
        let response = self
            .docker
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(|e| map_error("inspect_container", "container", id.as_str(), e))?;
        details_from(id, response)
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<i64> {
        let mut stream = std::pin::pin!(
            self.docker
                .wait_container(id.as_str(), None::<WaitContainerOptions<String>>)
        );
        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard reports non-zero exits as an error carrying the code
            Some(Err(DockerError::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(map_error("wait_container", "container", id.as_str(), e)),
            None => Err(FixtureError::Engine {
                operation: "wait_container",
                message: format!("wait stream for {id} ended without a status"),
            }),
        }
    }

    async fn container_logs(&self, id: &ContainerId) -> Result<Vec<u8>> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        let mut stream = std::pin::pin!(self.docker.logs(id.as_str(), Some(options)));
        let mut combined = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| map_error("container_logs", "container", id.as_str(), e))?;
            combined.extend_from_slice(&chunk.into_bytes());
        }
        Ok(combined)
    }

    async fn create_exec(&self, id: &ContainerId, request: &ExecRequest) -> Result<ExecId> {
        let options = CreateExecOptions {
            user: Some(request.user.clone()),
            privileged: Some(false),
            tty: Some(false),
            attach_stdin: Some(false),
            // output is attached even when the caller ignores it
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            cmd: Some(request.command.clone()),
            ..Default::default()
        };
        let response = self
            .docker
            .create_exec(id.as_str(), options)
            .await
            .map_err(|e| map_error("create_exec", "container", id.as_str(), e))?;
        Ok(ExecId::new(response.id))
    }

    async fn start_exec(&self, exec: &ExecId) -> Result<Vec<u8>> {
        let options = StartExecOptions {
            detach: false,
            tty: false,
            ..Default::default()
        };
        let results = self
            .docker
            .start_exec(exec.as_str(), Some(options))
            .await
            .map_err(|e| map_error("start_exec", "exec", exec.as_str(), e))?;
        let StartExecResults::Attached { mut output, .. } = results else {
            return Ok(Vec::new());
        };
        let mut combined = Vec::new();
        while let Some(chunk) = output.next().await {
            let chunk = chunk.map_err(|e| map_error("start_exec", "exec", exec.as_str(), e))?;
            combined.extend_from_slice(&chunk.into_bytes());
        }
        Ok(combined)
    }

    async fn inspect_exec(&self, exec: &ExecId) -> Result<ExecStatus> {
        let response = self
            .docker
            .inspect_exec(exec.as_str())
            .await
            .map_err(|e| map_error("inspect_exec", "exec", exec.as_str(), e))?;
        Ok(ExecStatus {
            running: response.running.unwrap_or(false),
            exit_code: response.exit_code,
        })
    }

    fn build_image(&self, tag: &str, context: Vec<u8>) -> BoxStream<'_, Result<BuildMessage>> {
        let options = BuildImageOptions {
            dockerfile: "Dockerfile".to_string(),
            t: tag.to_string(),
            rm: true,
            ..Default::default()
        };
        let tag = tag.to_string();
        self.docker
            .build_image(options, None, Some(Bytes::from(context)))
            .map_ok(build_message)
            .map_err(move |e| map_error("build_image", "image", &tag, e))
            .boxed()
    }

    async fn remove_image(&self, tag: &str, force: bool) -> Result<()> {
        let options = RemoveImageOptions {
            force,
            ..Default::default()
        };
        let _ = self
            .docker
            .remove_image(tag, Some(options), None)
            .await
            .map_err(|e| map_error("remove_image", "image", tag, e))?;
        Ok(())
    }

    async fn create_network(&self, name: &str) -> Result<NetworkId> {
        let options = CreateNetworkOptions {
            name: name.to_string(),
            ..Default::default()
        };
        let response = self
            .docker
            .create_network(options)
            .await
            .map_err(|e| map_error("create_network", "network", name, e))?;
        network_id_from(name, response)
    }

    async fn remove_network(&self, id: &NetworkId) -> Result<()> {
        self.docker
            .remove_network(id.as_str())
            .await
            .map_err(|e| map_error("remove_network", "network", id.as_str(), e))
    }

    async fn create_volume(&self, name: &str) -> Result<VolumeInfo> {
        let options = CreateVolumeOptions {
            name: name.to_string(),
            driver: "local".to_string(),
            ..Default::default()
        };
        let volume = self
            .docker
            .create_volume(options)
            .await
            .map_err(|e| map_error("create_volume", "volume", name, e))?;
        Ok(VolumeInfo {
            name: volume.name,
            driver: volume.driver,
            mountpoint: volume.mountpoint,
        })
    }

    async fn remove_volume(&self, name: &str, force: bool) -> Result<()> {
        self.docker
            .remove_volume(name, Some(RemoveVolumeOptions { force }))
            .await
            .map_err(|e| map_error("remove_volume", "volume", name, e))
    }

    async fn copy_from_container(&self, id: &ContainerId, path: &str) -> Result<Vec<u8>> {
        let options = DownloadFromContainerOptions {
            path: path.to_string(),
        };
        let mut stream =
            std::pin::pin!(self.docker.download_from_container(id.as_str(), Some(options)));
        let mut archive = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| map_error("copy_from_container", "path", path, e))?;
            archive.extend_from_slice(&chunk);
        }
        Ok(archive)
    }
}
