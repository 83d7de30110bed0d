//! # mqfix: messaging-server fixture CLI
//!
//! Drives the same fixture controller the tests use, one step at a time,
//! so an image can be poked at by hand while a test is being debugged.

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::execute(cli).await
}
