//! Stream catalog resolution: asks a provider which streams exist for a
//! video reference.
//!
//! The resolver is the place where provider responses are classified into
//! the crate's error taxonomy, so the orchestrator never has to inspect raw
//! message text.

use crate::error::{Error, Result};
use crate::model::{Catalog, StreamDescriptor, StreamKind, VideoReference};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

const PRIMARY_API: &str = "https://pipedapi.kavin.rocks";
const FALLBACK_API: &str = "https://pipedapi.adminforge.de";

/// A source of stream catalogs.
///
/// Implementations perform a single metadata call; no local state is created.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// A short human-readable provider name, used in logs and errors.
    fn name(&self) -> &str;

    /// Retrieves the catalog of available streams for the given reference.
    ///
    /// # Errors
    ///
    /// * [`Error::VideoUnavailable`] when the provider reports the video
    ///   missing, private or region-blocked (terminal).
    /// * [`Error::Provider`] for transport-level failures (recoverable).
    async fn resolve(&self, reference: &VideoReference) -> Result<Catalog>;
}

/// A piped-style streams API: `GET {base_url}/streams/{id}` returning the
/// video metadata and its stream lists as JSON.
pub struct StreamApiProvider {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl StreamApiProvider {
    /// Creates a provider against the given API instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client could not be built.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// The default primary provider instance.
    pub fn primary() -> Result<Self> {
        Self::new("primary", PRIMARY_API)
    }

    /// The default fallback provider instance.
    pub fn fallback() -> Result<Self> {
        Self::new("fallback", FALLBACK_API)
    }

    fn classify_status(&self, status: StatusCode) -> Error {
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE | StatusCode::FORBIDDEN
            | StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS => Error::VideoUnavailable(format!(
                "{} answered {status}",
                self.name
            )),
            _ => Error::Provider {
                status: Some(status.as_u16()),
                message: format!("{} answered {status}", self.name),
            },
        }
    }
}

impl fmt::Display for StreamApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamApiProvider(name = {}, base_url = {})", self.name, self.base_url)
    }
}

#[async_trait]
impl CatalogProvider for StreamApiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, reference: &VideoReference) -> Result<Catalog> {
        tracing::debug!(provider = %self.name, reference = %reference, "resolving stream catalog");

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("rust-reqwest"));

        let url = format!("{}/streams/{}", self.base_url, reference.as_str());
        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| Error::Provider {
                status: None,
                message: format!("{}: {e}", self.name),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.classify_status(status));
        }

        let body: StreamsResponse = response.json().await.map_err(|e| Error::Provider {
            status: Some(status.as_u16()),
            message: format!("{}: malformed catalog response: {e}", self.name),
        })?;

        // Some instances answer 200 with an error payload instead of a
        // proper status code.
        if let Some(message) = body.error {
            return Err(Error::VideoUnavailable(message));
        }

        Ok(body.into_catalog(reference))
    }
}

/// Wire shape of the `/streams/{id}` response.
#[derive(Debug, Deserialize)]
struct StreamsResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    duration: u64,
    #[serde(rename = "videoStreams", default)]
    video_streams: Vec<WireStream>,
    #[serde(rename = "audioStreams", default)]
    audio_streams: Vec<WireStream>,
}

#[derive(Debug, Deserialize)]
struct WireStream {
    url: String,
    #[serde(default)]
    format: String,
    #[serde(default)]
    quality: String,
    #[serde(rename = "videoOnly", default)]
    video_only: bool,
    #[serde(default)]
    itag: Option<i64>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    bitrate: Option<u64>,
}

impl StreamsResponse {
    fn into_catalog(self, reference: &VideoReference) -> Catalog {
        let mut streams = Vec::with_capacity(self.video_streams.len() + self.audio_streams.len());

        for wire in self.video_streams {
            let kind = if wire.video_only {
                StreamKind::VideoOnly
            } else {
                StreamKind::Combined
            };
            streams.push(wire.into_descriptor(kind));
        }
        for wire in self.audio_streams {
            streams.push(wire.into_descriptor(StreamKind::AudioOnly));
        }

        Catalog {
            reference: reference.as_str().to_string(),
            title: self.title,
            duration_seconds: self.duration,
            streams,
        }
    }
}

impl WireStream {
    fn into_descriptor(self, kind: StreamKind) -> StreamDescriptor {
        let id = self
            .itag
            .map(|itag| itag.to_string())
            .unwrap_or_else(|| format!("{}-{}", self.quality, self.format));

        StreamDescriptor {
            id,
            kind,
            container: self.format,
            width: self.width,
            height: self.height,
            bitrate: self.bitrate,
            quality_label: self.quality,
            url: self.url,
        }
    }
}
