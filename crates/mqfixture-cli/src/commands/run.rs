//! `mqfix run`: create and start a container and leave it running.

use clap::Args;
use mqfixture::{ContainerSpec, Fixture};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Environment variables in `KEY=VALUE` form.
    #[arg(short, long = "env", value_parser = parse_env)]
    pub env: Vec<(String, String)>,

    /// Mounts in `source:target` form.
    #[arg(short = 'v', long = "mount")]
    pub mounts: Vec<String>,

    /// Network to attach to.
    #[arg(long)]
    pub network: Option<String>,

    /// Wait for the readiness probe before returning.
    #[arg(long)]
    pub wait_ready: bool,

    /// Command passed to the image entrypoint.
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,
}

fn parse_env(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if the container cannot be started or never becomes
/// ready. A container that fails readiness is removed again.
pub async fn execute(fixture: &Fixture, args: RunArgs) -> anyhow::Result<()> {
    let mut spec = ContainerSpec::new();
    for (key, value) in &args.env {
        spec = spec.env(key, value);
    }
    for mount in args.mounts {
        spec = spec.mount(mount);
    }
    if let Some(network) = args.network {
        spec = spec.network(network);
    }
    if !args.command.is_empty() {
        spec = spec.command(args.command);
    }

    let handle = fixture.create_and_start(spec).await?;
    if args.wait_ready {
        if let Err(err) = fixture.wait_ready(&handle).await {
            crate::output::print_report(&fixture.stop_and_remove(&handle).await);
            return Err(err.into());
        }
    }

    println!("{}", handle.id);
    match fixture.web_port(&handle).await {
        Ok(port) => println!("web console: https://localhost:{port}"),
        Err(err) => tracing::warn!(error = %err, "no web console port"),
    }
    Ok(())
}
