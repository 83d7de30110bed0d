//! `mqfix one-shot`: run a container to completion.

use std::time::Duration;

use clap::Args;
use mqfixture::Fixture;

/// Arguments for the `one-shot` command.
#[derive(Args, Debug)]
pub struct OneShotArgs {
    /// Seconds to wait for the container to exit.
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Entrypoint replacing the image's.
    #[arg(trailing_var_arg = true, required = true)]
    pub entrypoint: Vec<String>,
}

/// Executes the `one-shot` command, printing the logs and exiting with the
/// container's exit code.
///
/// # Errors
///
/// Returns an error if the container cannot be run or does not exit in time.
pub async fn execute(fixture: &Fixture, args: OneShotArgs) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(args.timeout);
    let (code, logs) = fixture.run_one_shot(args.entrypoint, Some(timeout)).await?;
    print!("{logs}");
    super::exit_with(code)
}
