//! `mqfix logs`: show a container's logs.

use clap::Args;
use mqfixture::Fixture;

/// Arguments for the `logs` command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Container ID or name.
    pub container: String,

    /// Print raw JSON log lines instead of their messages.
    #[arg(long)]
    pub raw: bool,
}

/// Executes the `logs` command.
///
/// # Errors
///
/// Returns an error if the container is not found or logs are unavailable.
pub async fn execute(fixture: &Fixture, args: LogsArgs) -> anyhow::Result<()> {
    let handle = super::handle(&args.container);
    let logs = if args.raw {
        fixture.logs(&handle).await?
    } else {
        fixture.text_logs(&handle).await?
    };

    if logs.is_empty() {
        println!("No logs available for container: {}", args.container);
    } else {
        print!("{logs}");
    }
    Ok(())
}
