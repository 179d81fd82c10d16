//! Streamed transfer of one remote stream into a local temporary file.

use crate::error::{Error, Result};
use crate::model::{LocalArtifact, StreamDescriptor};
use crate::utils::file_system;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::USER_AGENT;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Moves one remote stream's bytes to a local destination.
///
/// The pipeline goes through this seam rather than a concrete client, the
/// same way catalog resolution goes through [`CatalogProvider`], so
/// transfers can be substituted.
///
/// [`CatalogProvider`]: crate::resolver::CatalogProvider
#[async_trait]
pub trait StreamTransfer: Send + Sync {
    /// Streams the descriptor's remote bytes into `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transfer`] on any network or I/O failure during the
    /// transfer, carrying the underlying message.
    async fn fetch(
        &self,
        descriptor: &StreamDescriptor,
        destination: &Path,
    ) -> Result<LocalArtifact>;
}

/// Downloads stream bytes to the local file system.
///
/// The destination file is created before the transfer begins and is left in
/// place on failure for inspection; the returned error tells the pipeline
/// the artifact is not usable. Retrying is the orchestrator's concern, not
/// the fetcher's.
pub struct Fetcher {
    client: reqwest::Client,
}

impl fmt::Display for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fetcher")
    }
}

impl Fetcher {
    /// Creates a fetcher with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client could not be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl StreamTransfer for Fetcher {
    async fn fetch(
        &self,
        descriptor: &StreamDescriptor,
        destination: &Path,
    ) -> Result<LocalArtifact> {
        tracing::debug!(
            stream = %descriptor.id,
            kind = %descriptor.kind,
            destination = ?destination,
            "starting stream transfer"
        );

        file_system::create_parent_dir(destination)?;

        // The file exists before the first byte arrives; a failed transfer
        // leaves it behind for the caller to inspect or clean up.
        let mut dest = file_system::create_file(destination).await?;

        let response = self
            .client
            .get(&descriptor.url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|e| Error::Transfer(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Transfer(e.to_string()))?;

        let mut stream = response.bytes_stream();

        // Buffer writes to avoid a syscall per network chunk.
        let mut buffer = Vec::with_capacity(1024 * 1024);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Transfer(e.to_string()))?;
            buffer.extend_from_slice(&chunk);

            if buffer.len() >= 1024 * 1024 {
                dest.write_all(&buffer)
                    .await
                    .map_err(|e| Error::Transfer(e.to_string()))?;
                buffer.clear();
            }
        }

        if !buffer.is_empty() {
            dest.write_all(&buffer)
                .await
                .map_err(|e| Error::Transfer(e.to_string()))?;
        }

        dest.flush()
            .await
            .map_err(|e| Error::Transfer(e.to_string()))?;

        tracing::debug!(stream = %descriptor.id, "stream transfer complete");

        Ok(LocalArtifact {
            path: destination.to_path_buf(),
            temporary: true,
        })
    }
}
