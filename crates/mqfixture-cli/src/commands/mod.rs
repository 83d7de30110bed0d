//! CLI command definitions and dispatch.

pub mod build;
pub mod clean;
pub mod exec;
pub mod logs;
pub mod one_shot;
pub mod run;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mqfixture::{ContainerHandle, Fixture};
use mqfixture_common::config::FixtureConfig;
use mqfixture_common::constants::ENV_TEST_IMAGE;
use mqfixture_common::types::{ContainerId, TestRun};

/// mqfix: disposable messaging-server containers for image tests.
#[derive(Parser, Debug)]
#[command(name = "mqfix", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Settings shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Fixture settings shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Image to run.
    #[arg(long, global = true, env = ENV_TEST_IMAGE)]
    pub image: Option<String>,

    /// Honor the coverage exit-code override (also enabled by `TEST_COVER`).
    #[arg(long, global = true)]
    pub cover: bool,

    /// Test name used for container, volume, network and image names.
    #[arg(long, global = true, default_value = "mqfix")]
    pub name: String,

    /// JSON fixture configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    /// Resolves the fixture configuration: file or environment first, then
    /// command-line overrides.
    fn fixture_config(&self) -> anyhow::Result<FixtureConfig> {
        let mut config = match &self.config {
            Some(path) => FixtureConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => FixtureConfig::from_env(),
        };
        if let Some(image) = &self.image {
            config.image.clone_from(image);
        }
        config.coverage |= self.cover;
        config.validate().context("invalid fixture configuration")?;
        Ok(config)
    }

    /// Connects a fixture to the local engine.
    pub fn fixture(&self) -> anyhow::Result<Fixture> {
        let config = self.fixture_config()?;
        tracing::debug!(?config, name = %self.name, "fixture configuration");
        Fixture::connect(config, TestRun::new(&self.name)).context("connecting to the engine")
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create and start a container, leaving it running.
    Run(run::RunArgs),
    /// Run a command inside a running container.
    Exec(exec::ExecArgs),
    /// Show a container's logs.
    Logs(logs::LogsArgs),
    /// Stop and remove a container, printing its diagnostics.
    Clean(clean::CleanArgs),
    /// Build a throwaway image from a Dockerfile.
    Build(build::BuildArgs),
    /// Run a container to completion with its entrypoint replaced.
    OneShot(one_shot::OneShotArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let fixture = cli.global.fixture()?;
    match cli.command {
        Command::Run(args) => run::execute(&fixture, args).await,
        Command::Exec(args) => exec::execute(&fixture, args).await,
        Command::Logs(args) => logs::execute(&fixture, args).await,
        Command::Clean(args) => clean::execute(&fixture, args).await,
        Command::Build(args) => build::execute(&fixture, args).await,
        Command::OneShot(args) => one_shot::execute(&fixture, args).await,
    }
}

/// Builds a handle for a container created by an earlier invocation.
fn handle(container: &str) -> ContainerHandle {
    ContainerHandle {
        id: ContainerId::new(container),
        name: container.to_string(),
    }
}

/// Exits the process with a container-reported exit code.
fn exit_with(code: i64) -> ! {
    std::process::exit(i32::try_from(code).unwrap_or(1))
}
