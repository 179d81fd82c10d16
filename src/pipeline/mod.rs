//! The fallback orchestrator: runs the resolve → select → fetch → mux
//! sequence against the primary provider and, when the failure is
//! recoverable, once more against the fallback provider.
//!
//! This is the single place that decides retry-vs-surface. Every attempt
//! outcome is logged exactly once here.

use crate::Pipeline;
use crate::error::{Error, Result};
use crate::fetcher::StreamTransfer;
use crate::model::selector::{self, SelectionPlan, SelectionPolicy};
use crate::model::{Catalog, MediaResult, StreamDescriptor, VideoReference};
use crate::resolver::CatalogProvider;
use crate::utils::file_system;
use std::path::PathBuf;

impl Pipeline {
    /// Runs the whole pipeline for one reference.
    ///
    /// Starts against the primary provider with the strict selection rule.
    /// A recoverable failure (throttling, transport error, no suitable
    /// format) triggers exactly one retry against the fallback provider with
    /// the relaxed rule; the second attempt never starts before the first
    /// has fully terminated. Terminal failures surface immediately.
    ///
    /// # Errors
    ///
    /// Returns the primary error when it is terminal, or
    /// [`Error::Fallback`] aggregating both providers' errors when the
    /// second attempt fails too.
    pub async fn run(&self, reference: &VideoReference) -> Result<MediaResult> {
        tracing::info!(reference = %reference, provider = self.primary.name(), "starting pipeline");

        let primary_error = match self.attempt(self.primary.as_ref(), SelectionPolicy::Strict, reference).await
        {
            Ok(media) => {
                tracing::info!(reference = %reference, path = ?media.path, "pipeline succeeded");
                return Ok(media);
            }
            Err(error) if error.is_recoverable() => {
                tracing::warn!(
                    reference = %reference,
                    stage = error.stage(),
                    error = %error,
                    "primary attempt failed, switching to fallback provider"
                );
                error
            }
            Err(error) => {
                tracing::error!(
                    reference = %reference,
                    stage = error.stage(),
                    error = %error,
                    "pipeline failed with a terminal error"
                );
                return Err(error);
            }
        };

        match self.attempt(self.secondary.as_ref(), SelectionPolicy::Relaxed, reference).await {
            Ok(media) => {
                tracing::info!(
                    reference = %reference,
                    provider = self.secondary.name(),
                    path = ?media.path,
                    "fallback attempt succeeded"
                );
                Ok(media)
            }
            Err(secondary_error) => {
                tracing::error!(
                    reference = %reference,
                    stage = secondary_error.stage(),
                    error = %secondary_error,
                    "fallback attempt failed too"
                );
                Err(Error::Fallback {
                    primary: Box::new(primary_error),
                    secondary: Box::new(secondary_error),
                })
            }
        }
    }

    /// One full resolve → select → fetch → mux pass against one provider.
    async fn attempt(
        &self,
        provider: &dyn CatalogProvider,
        policy: SelectionPolicy,
        reference: &VideoReference,
    ) -> Result<MediaResult> {
        let catalog = provider.resolve(reference).await?;
        let plan = selector::select(&catalog, policy, self.target_height)?;

        match plan {
            SelectionPlan::Combined(stream) => {
                tracing::debug!(stream = %stream, "fetching progressive stream");

                let destination = self.temp_path("short", &stream);
                let artifact = self.fetcher.fetch(&stream, &destination).await?;

                Ok(describe(&catalog, &stream, artifact.path))
            }
            SelectionPlan::Paired { video, audio } => {
                tracing::debug!(video = %video, audio = %audio, "fetching adaptive stream pair");

                let video_dest = self.temp_path("video", &video);
                let audio_dest = self.temp_path("audio", &audio);

                // Both transfers run concurrently; the merge waits on both.
                // A failed side abandons the other's partial artifact: any
                // retry happens at the provider level, not per stream.
                let (video_result, audio_result) = tokio::join!(
                    self.fetcher.fetch(&video, &video_dest),
                    self.fetcher.fetch(&audio, &audio_dest)
                );

                let video_artifact = video_result?;
                let audio_artifact = audio_result?;

                let output = file_system::temp_media_path(&self.output_dir, "short", "mp4");
                let merged = self
                    .muxer
                    .mux(&video_artifact, &audio_artifact, &output)
                    .await?;

                Ok(describe(&catalog, &video, merged.path))
            }
        }
    }

    fn temp_path(&self, stage: &str, stream: &StreamDescriptor) -> PathBuf {
        let extension = if stream.is_mp4() {
            if stream.kind == crate::model::StreamKind::AudioOnly {
                "m4a"
            } else {
                "mp4"
            }
        } else {
            "webm"
        };

        file_system::temp_media_path(&self.output_dir, stage, extension)
    }
}

/// Builds the final media descriptor from the catalog metadata and the
/// stream the dimensions came from.
///
/// Duration comes straight from the catalog: the video track is copied, not
/// re-encoded, so its timing is unchanged. A missing width is derived 16:9
/// from the height.
fn describe(catalog: &Catalog, stream: &StreamDescriptor, path: PathBuf) -> MediaResult {
    let height = stream.height.unwrap_or(selector::TARGET_HEIGHT);
    let width = stream.width.unwrap_or(height * 16 / 9);

    MediaResult {
        path,
        duration_seconds: catalog.duration_seconds,
        width,
        height,
    }
}
