//! `mqfix clean`: stop and remove a container.

use clap::Args;
use mqfixture::Fixture;

/// Arguments for the `clean` command.
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Container IDs or names.
    #[arg(required = true)]
    pub containers: Vec<String>,

    /// Also remove the volume named after the test.
    #[arg(long)]
    pub volume: bool,
}

/// Executes the `clean` command.
///
/// Every container is cleaned up even if an earlier one fails.
///
/// # Errors
///
/// Returns an error if any container could not be removed.
pub async fn execute(fixture: &Fixture, args: CleanArgs) -> anyhow::Result<()> {
    let mut leaked = Vec::new();
    for container in &args.containers {
        let report = fixture.stop_and_remove(&super::handle(container)).await;
        crate::output::print_report(&report);
        if !report.removed() {
            leaked.push(container.as_str());
        }
    }

    if args.volume {
        fixture.remove_volume(fixture.run().volume_name()).await?;
    }

    if leaked.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("failed to remove: {}", leaked.join(", "))
    }
}
