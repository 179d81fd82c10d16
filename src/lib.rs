//! shortreel fetches a YouTube video and produces a locally playable MP4
//! suitable for a vertical short.
//!
//! The pipeline resolves the remote stream catalog, selects either one
//! progressive stream or a best-video/best-audio pair, downloads the needed
//! streams, and remuxes separately fetched tracks into a single container.
//! When the primary provider throttles or fails in a recoverable way, the
//! whole pipeline is retried once against a fallback provider with a relaxed
//! selection rule.
//!
//! # Examples
//!
//! ```rust, no_run
//! # use shortreel::{Pipeline, VideoReference};
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reference = VideoReference::from_url("https://youtu.be/dQw4w9WgXcQ")?;
//!
//! let pipeline = Pipeline::new("ffmpeg", "output")?;
//! let media = pipeline.run(&reference).await?;
//!
//! println!("Saved {:?} ({}x{})", media.path, media.width, media.height);
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::fetcher::{Fetcher, StreamTransfer};
use crate::model::selector::TARGET_HEIGHT;
use crate::muxer::Muxer;
use crate::resolver::{CatalogProvider, StreamApiProvider};
use crate::utils::file_system;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod error;
pub mod executor;
pub mod fetcher;
pub mod model;
pub mod muxer;
pub mod pipeline;
pub mod promo;
pub mod resolver;
pub mod utils;

pub use error::{Error, Result as PipelineResult};
pub use model::{MediaResult, VideoReference};

/// The acquisition-and-muxing pipeline.
///
/// Holds everything one run needs: the two catalog providers, the stream
/// fetcher, the muxer with its injected ffmpeg path, and the output
/// directory where artifacts land. The orchestration itself lives in the
/// [`pipeline`] module.
pub struct Pipeline {
    /// The provider tried first, with the strict selection rule.
    pub(crate) primary: Box<dyn CatalogProvider>,
    /// The provider used after a recoverable primary failure.
    pub(crate) secondary: Box<dyn CatalogProvider>,
    pub(crate) fetcher: Box<dyn StreamTransfer>,
    pub(crate) muxer: Muxer,
    /// The directory where stream artifacts and the final file are written.
    pub(crate) output_dir: PathBuf,
    /// The resolution tier the selection aims for.
    pub(crate) target_height: u32,
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pipeline(primary = {}, secondary = {}, output_dir = {:?})",
            self.primary.name(),
            self.secondary.name(),
            self.output_dir
        )
    }
}

impl Pipeline {
    /// Creates a pipeline with the default provider pair.
    ///
    /// # Arguments
    ///
    /// * `ffmpeg` - The ffmpeg executable the muxer will invoke.
    /// * `output_dir` - The directory where artifacts are written.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory could not be created or an
    /// HTTP client could not be built.
    pub fn new(ffmpeg: impl Into<PathBuf>, output_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_providers(
            Box::new(StreamApiProvider::primary()?),
            Box::new(StreamApiProvider::fallback()?),
            Muxer::new(ffmpeg),
            output_dir,
        )
    }

    /// Creates a pipeline with explicit providers, for alternate API
    /// instances or tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory could not be created or an
    /// HTTP client could not be built.
    pub fn with_providers(
        primary: Box<dyn CatalogProvider>,
        secondary: Box<dyn CatalogProvider>,
        muxer: Muxer,
        output_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        file_system::create_dir(output_dir.as_ref())?;

        Ok(Self {
            primary,
            secondary,
            fetcher: Box::new(Fetcher::new()?),
            muxer,
            output_dir: output_dir.as_ref().to_path_buf(),
            target_height: TARGET_HEIGHT,
        })
    }

    /// Sets the resolution tier the selection aims for.
    pub fn with_target_height(mut self, height: u32) -> Self {
        self.target_height = height;
        self
    }
}
