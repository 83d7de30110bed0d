//! Throwaway image builds.

use futures::StreamExt;
use mqfixture_common::error::{FixtureError, Result};
use mqfixture_engine::archive::{self, ContextFile};

use crate::fixture::Fixture;

impl Fixture {
    /// Builds an image from an in-memory build context and returns its tag.
    ///
    /// The context must contain a `Dockerfile`. The image is tagged with the
    /// lower-cased test name; remove it with
    /// [`remove_image`](Self::remove_image) when the test is done.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be packed, the build cannot
    /// be started, or the build output reports an error.
    pub async fn build_image(&self, files: &[ContextFile]) -> Result<String> {
        let context = archive::pack(files)?;
        let tag = self.run.image_tag();
        tracing::info!(tag = %tag, files = files.len(), "building image");

        let mut progress = self.engine.build_image(&tag, context);
        while let Some(message) = progress.next().await {
            let message = message?;
            if let Some(error) = message.error {
                return Err(FixtureError::Build { message: error });
            }
            let line = message.stream.as_deref().map(str::trim);
            if let Some(line) = line.filter(|l| !l.is_empty()) {
                tracing::info!(tag = %tag, "{line}");
            }
        }

        tracing::info!(tag = %tag, "image built");
        Ok(tag)
    }
}
