//! `mqfix build`: build a throwaway image from a Dockerfile.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use mqfixture::{ContextFile, Fixture};

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Dockerfile to build.
    #[arg(default_value = "Dockerfile")]
    pub dockerfile: PathBuf,

    /// Extra files to add to the build context, by file name.
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,
}

/// Executes the `build` command and prints the image tag.
///
/// # Errors
///
/// Returns an error if a file cannot be read or the build fails.
pub async fn execute(fixture: &Fixture, args: BuildArgs) -> anyhow::Result<()> {
    let mut context = vec![read_context_file("Dockerfile", &args.dockerfile)?];
    for path in &args.files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("invalid file name: {}", path.display()))?;
        context.push(read_context_file(name, path)?);
    }

    let tag = fixture.build_image(&context).await?;
    println!("{tag}");
    Ok(())
}

fn read_context_file(name: &str, path: &Path) -> anyhow::Result<ContextFile> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(ContextFile::new(name, body))
}
