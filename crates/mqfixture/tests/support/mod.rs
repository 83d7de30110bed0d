//! Scripted in-memory engine shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use mqfixture::Fixture;
use mqfixture_common::config::{FixtureConfig, ReadyProbe};
use mqfixture_common::constants::{CONTAINER_TERMINATION_LOG, WEB_PORT};
use mqfixture_common::error::{FixtureError, Result};
use mqfixture_common::types::{ContainerId, ContainerState, ExecId, NetworkId, TestRun};
use mqfixture_engine::Engine;
use mqfixture_engine::backend::{
    BuildMessage, ContainerDetails, CreateRequest, HostBinding, RemoveOptions, VolumeInfo,
};
use mqfixture_engine::exec::{ExecRequest, ExecStatus};
use tempfile::TempDir;

/// Host port the fake publishes the web console on.
pub const FAKE_WEB_PORT: &str = "32768";

/// How the fake answers one exec.
#[derive(Debug, Clone)]
pub enum ExecReply {
    /// The exec runs and finishes with this code and output.
    Done(i64, &'static str),
    /// The engine rejects the start because an exec is already running.
    Busy,
}

#[derive(Debug, Default)]
pub struct State {
    pub calls: Vec<String>,
    pub requests: Vec<CreateRequest>,
    pub live: BTreeSet<String>,
    pub stopped: BTreeSet<String>,
    pub log_existed_at_create: Vec<bool>,
    pub exec_script: VecDeque<ExecReply>,
    pub exec_default: Option<ExecReply>,
    pub exec_requests: Vec<ExecRequest>,
    pub execs: HashMap<String, ExecReply>,
    pub fail_create: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub fail_remove_image: bool,
    pub wait_code: i64,
    pub wait_delay: Option<Duration>,
    pub logs: Vec<u8>,
    pub build_messages: Vec<BuildMessage>,
    pub builds: Vec<(String, Vec<u8>)>,
    pub networks: Vec<String>,
    pub volumes: Vec<String>,
    pub removed_images: Vec<String>,
    next_id: u32,
}

/// In-memory [`Engine`] whose answers are scripted through [`State`].
#[derive(Debug, Default)]
pub struct FakeEngine {
    state: Mutex<State>,
}

impl FakeEngine {
    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn script_execs(&self, replies: impl IntoIterator<Item = ExecReply>) {
        self.state().exec_script.extend(replies);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn record(&self, call: impl Into<String>) -> MutexGuard<'_, State> {
        let mut state = self.state();
        state.calls.push(call.into());
        state
    }
}

fn not_found(kind: &'static str, id: impl ToString) -> FixtureError {
    FixtureError::NotFound {
        kind,
        id: id.to_string(),
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn create_container(&self, request: &CreateRequest) -> Result<ContainerId> {
        let mut state = self.record("create");
        if state.fail_create {
            return Err(FixtureError::Engine {
                operation: "create_container",
                message: format!("No such image: {}", request.image),
            });
        }
        state.next_id += 1;
        let id = format!("c{:04}", state.next_id);
        let log_exists = request
            .binds
            .iter()
            .filter_map(|bind| bind.strip_suffix(&format!(":{CONTAINER_TERMINATION_LOG}")))
            .any(|source| PathBuf::from(source).exists());
        state.log_existed_at_create.push(log_exists);
        state.requests.push(request.clone());
        let _ = state.live.insert(id.clone());
        Ok(ContainerId::new(id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<()> {
        let state = self.record("start");
        if state.fail_start {
            return Err(FixtureError::Engine {
                operation: "start_container",
                message: "port is already allocated".into(),
            });
        }
        if !state.live.contains(id.as_str()) {
            return Err(not_found("container", id));
        }
        Ok(())
    }

    async fn stop_container(&self, id: &ContainerId, _grace: Duration) -> Result<()> {
        let mut state = self.record("stop");
        if state.fail_stop {
            return Err(FixtureError::Engine {
                operation: "stop_container",
                message: "cannot stop container".into(),
            });
        }
        if !state.live.contains(id.as_str()) {
            return Err(not_found("container", id));
        }
        let _ = state.stopped.insert(id.to_string());
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId, options: RemoveOptions) -> Result<()> {
        let mut state = self.record("remove");
        assert!(options.force && options.volumes);
        if state.live.remove(id.as_str()) {
            Ok(())
        } else {
            Err(not_found("container", id))
        }
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerDetails> {
        let state = self.record("inspect");
        if !state.live.contains(id.as_str()) {
            return Err(not_found("container", id));
        }
        let stopped = state.stopped.contains(id.as_str());
        let mut ports = BTreeMap::new();
        let _ = ports.insert(
            WEB_PORT.to_string(),
            vec![HostBinding {
                host_ip: Some("0.0.0.0".into()),
                host_port: Some(FAKE_WEB_PORT.into()),
            }],
        );
        Ok(ContainerDetails {
            id: id.clone(),
            name: format!("/{id}"),
            state: if stopped {
                ContainerState::Exited
            } else {
                ContainerState::Running
            },
            exit_code: stopped.then_some(state.wait_code),
            ip_address: Some("172.17.0.2".into()),
            ports,
            raw: serde_json::json!({ "Id": id.as_str() }),
        })
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<i64> {
        let (delay, code, known) = {
            let state = self.record("wait");
            (state.wait_delay, state.wait_code, state.live.contains(id.as_str()))
        };
        if !known {
            return Err(not_found("container", id));
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(code)
    }

    async fn container_logs(&self, id: &ContainerId) -> Result<Vec<u8>> {
        let state = self.record("logs");
        if !state.live.contains(id.as_str()) {
            return Err(not_found("container", id));
        }
        Ok(state.logs.clone())
    }

    async fn create_exec(&self, id: &ContainerId, request: &ExecRequest) -> Result<ExecId> {
        let mut state = self.record("create_exec");
        if !state.live.contains(id.as_str()) {
            return Err(not_found("container", id));
        }
        let reply = state
            .exec_script
            .pop_front()
            .or_else(|| state.exec_default.clone())
            .unwrap_or(ExecReply::Done(0, ""));
        state.next_id += 1;
        let exec = format!("e{:04}", state.next_id);
        state.exec_requests.push(request.clone());
        let _ = state.execs.insert(exec.clone(), reply);
        Ok(ExecId::new(exec))
    }

    async fn start_exec(&self, exec: &ExecId) -> Result<Vec<u8>> {
        let state = self.record("start_exec");
        match state.execs.get(exec.as_str()) {
            Some(ExecReply::Done(_, output)) => Ok(output.as_bytes().to_vec()),
            Some(ExecReply::Busy) => Err(FixtureError::ExecAlreadyRunning {
                message: format!("Exec command {exec} is already running"),
            }),
            None => Err(not_found("exec", exec)),
        }
    }

    async fn inspect_exec(&self, exec: &ExecId) -> Result<ExecStatus> {
        let state = self.record("inspect_exec");
        match state.execs.get(exec.as_str()) {
            Some(ExecReply::Done(code, _)) => Ok(ExecStatus {
                running: false,
                exit_code: Some(*code),
            }),
            Some(ExecReply::Busy) => Ok(ExecStatus {
                running: false,
                exit_code: None,
            }),
            None => Err(not_found("exec", exec)),
        }
    }

    fn build_image(&self, tag: &str, context: Vec<u8>) -> BoxStream<'_, Result<BuildMessage>> {
        let mut state = self.record("build");
        state.builds.push((tag.to_string(), context));
        let messages: Vec<Result<BuildMessage>> =
            state.build_messages.iter().cloned().map(Ok).collect();
        futures::stream::iter(messages).boxed()
    }

    async fn remove_image(&self, tag: &str, _force: bool) -> Result<()> {
        let mut state = self.record("remove_image");
        if state.fail_remove_image {
            return Err(FixtureError::Engine {
                operation: "remove_image",
                message: "image is being used by a stopped container".into(),
            });
        }
        state.removed_images.push(tag.to_string());
        Ok(())
    }

    async fn create_network(&self, name: &str) -> Result<NetworkId> {
        let mut state = self.record("create_network");
        state.networks.push(name.to_string());
        Ok(NetworkId::new(format!("net-{name}")))
    }

    async fn remove_network(&self, id: &NetworkId) -> Result<()> {
        let mut state = self.record("remove_network");
        let name = id.as_str().strip_prefix("net-").unwrap_or(id.as_str());
        let before = state.networks.len();
        state.networks.retain(|n| n != name);
        if state.networks.len() == before {
            return Err(not_found("network", id));
        }
        Ok(())
    }

    async fn create_volume(&self, name: &str) -> Result<VolumeInfo> {
        let mut state = self.record("create_volume");
        state.volumes.push(name.to_string());
        Ok(VolumeInfo {
            name: name.to_string(),
            driver: "local".into(),
            mountpoint: format!("/var/lib/docker/volumes/{name}/_data"),
        })
    }

    async fn remove_volume(&self, name: &str, force: bool) -> Result<()> {
        let mut state = self.record("remove_volume");
        assert!(force);
        let before = state.volumes.len();
        state.volumes.retain(|v| v != name);
        if state.volumes.len() == before {
            return Err(not_found("volume", name));
        }
        Ok(())
    }

    async fn copy_from_container(&self, id: &ContainerId, path: &str) -> Result<Vec<u8>> {
        let state = self.record("copy_from_container");
        if !state.live.contains(id.as_str()) {
            return Err(not_found("container", id));
        }
        let name = path.rsplit('/').next().unwrap_or(path);
        let body = b"copied";
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        let mut builder = tar::Builder::new(Vec::new());
        builder.append_data(&mut header, name, &body[..]).unwrap();
        Ok(builder.into_inner().unwrap())
    }
}

/// A fixture wired to a [`FakeEngine`], with every host path inside a
/// temporary directory and every delay shortened.
pub struct Harness {
    pub fixture: Fixture,
    pub engine: Arc<FakeEngine>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(test: &str) -> Self {
        Self::with_config(test, |_| {})
    }

    pub fn with_config(test: &str, adjust: impl FnOnce(&mut FixtureConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FixtureConfig {
            coverage_dir: dir.path().join("coverage"),
            termination_log_dir: dir.path().to_path_buf(),
            stop_grace: Duration::from_millis(10),
            log_timeout: Duration::from_millis(500),
            exec_poll_interval: Duration::from_millis(1),
            exec_retry_backoff: Duration::from_millis(1),
            exec_retry_limit: 3,
            ready_probe: ReadyProbe {
                poll_interval: Duration::from_millis(1),
                ..ReadyProbe::default()
            },
            ..FixtureConfig::default()
        };
        adjust(&mut config);

        let engine = Arc::new(FakeEngine::default());
        let fixture = Fixture::new(engine.clone(), config, TestRun::new(test));
        Self {
            fixture,
            engine,
            dir,
        }
    }

    pub fn coverage_dir(&self) -> PathBuf {
        self.dir.path().join("coverage")
    }
}
