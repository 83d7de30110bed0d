//! `mqfix exec`: run a command inside a running container.

use clap::Args;
use mqfixture::Fixture;
use mqfixture_common::constants::READY_PROBE_USER;

/// Arguments for the `exec` command.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Container ID or name.
    pub container: String,

    /// User to run the command as.
    #[arg(short, long, default_value = READY_PROBE_USER)]
    pub user: String,

    /// Command to execute.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

/// Executes the `exec` command, exiting with the command's exit code.
///
/// # Errors
///
/// Returns an error if the container is not running.
pub async fn execute(fixture: &Fixture, args: ExecArgs) -> anyhow::Result<()> {
    let handle = super::handle(&args.container);
    let output = fixture.exec(&handle, &args.user, args.command).await?;
    if !output.output.is_empty() {
        println!("{}", output.output);
    }
    super::exit_with(output.exit_code)
}
