//! Merges separately fetched video and audio streams into one container.
//!
//! The video track is copied unmodified; the audio track is re-encoded to
//! AAC so the output plays everywhere. No full transcode ever happens here.

use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::model::LocalArtifact;
use crate::utils;
use crate::utils::file_system;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Combines adaptive streams with ffmpeg.
///
/// The ffmpeg path is injected at construction; nothing here reads ambient
/// global state.
#[derive(Debug, Clone, PartialEq)]
pub struct Muxer {
    ffmpeg: PathBuf,
    timeout: Duration,
}

impl fmt::Display for Muxer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Muxer(ffmpeg = {:?})", self.ffmpeg)
    }
}

impl Muxer {
    /// Creates a muxer using the given ffmpeg executable.
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            timeout: Duration::from_secs(300),
        }
    }

    /// Sets the timeout for the remux subprocess.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Merges the two input artifacts into a fresh output file.
    ///
    /// On success both inputs are deleted; their lifetime ends here. On
    /// failure they are left in place and the error propagates; the merge
    /// is never retried against the same inputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mux`] if the remux process reports an error.
    pub async fn mux(
        &self,
        video: &LocalArtifact,
        audio: &LocalArtifact,
        output: impl AsRef<Path>,
    ) -> Result<LocalArtifact> {
        tracing::debug!(
            video = ?video.path,
            audio = ?audio.path,
            output = ?output.as_ref(),
            "merging streams"
        );

        let args = combine_args(&video.path, &audio.path, output.as_ref())?;

        let executor = Executor {
            executable_path: self.ffmpeg.clone(),
            timeout: self.timeout,
            args,
        };

        executor.execute().await.map_err(as_mux_error)?;

        file_system::remove_temp_file(&video.path).await;
        file_system::remove_temp_file(&audio.path).await;

        Ok(LocalArtifact {
            path: output.as_ref().to_path_buf(),
            temporary: false,
        })
    }
}

/// Folds subprocess failures into [`Error::Mux`]. A remux failure is
/// terminal whether ffmpeg exited non-zero or hung until the timeout: the
/// inputs would not change on a retry.
fn as_mux_error(error: Error) -> Error {
    match error {
        Error::Command(message) => Error::Mux(message),
        Error::Timeout(duration) => Error::Mux(format!(
            "Remux process timed out after {duration:?}"
        )),
        other => other,
    }
}

/// The ffmpeg argument list: copy the video elementary stream, re-encode
/// audio to AAC, write a new container.
fn combine_args(video: &Path, audio: &Path, output: &Path) -> Result<Vec<String>> {
    let video = video
        .to_str()
        .ok_or(Error::Path("Invalid video path".to_string()))?;
    let audio = audio
        .to_str()
        .ok_or(Error::Path("Invalid audio path".to_string()))?;
    let output = output
        .to_str()
        .ok_or(Error::Path("Invalid output path".to_string()))?;

    Ok(utils::to_owned(vec![
        "-y", "-i", video, "-i", audio, "-c:v", "copy", "-c:a", "aac", output,
    ]))
}
