//! The models used to represent a video reference, the remote stream catalog
//! and the pipeline's local outputs.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub mod selector;

pub use selector::{SelectionPlan, SelectionPolicy};

const URL_PATTERNS: [&str; 3] = [
    r"youtube\.com/watch\?v=([A-Za-z0-9_-]{11})",
    r"youtu\.be/([A-Za-z0-9_-]{11})",
    r"youtube\.com/shorts/([A-Za-z0-9_-]{11})",
];

/// A validated YouTube video id, extracted from a user-supplied URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoReference(String);

impl VideoReference {
    /// Validates a bare video id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] if the id is not an 11-character
    /// `[A-Za-z0-9_-]` string.
    pub fn parse(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref().trim();
        let valid = id.len() == 11
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if !valid {
            return Err(Error::InvalidReference(id.to_string()));
        }

        Ok(Self(id.to_string()))
    }

    /// Extracts a video id from a full YouTube URL.
    ///
    /// Accepts `youtube.com/watch?v=`, `youtu.be/` and `youtube.com/shorts/`
    /// shapes. A bare id is accepted as well.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] if the URL matches no known shape.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.trim();

        for pattern in URL_PATTERNS.iter() {
            let re = Regex::new(pattern).unwrap();
            if let Some(captures) = re.captures(url) {
                if let Some(id) = captures.get(1) {
                    return Self::parse(id.as_str());
                }
            }
        }

        // Fall back to treating the whole input as a bare id.
        Self::parse(url).map_err(|_| Error::InvalidReference(url.to_string()))
    }

    /// The raw 11-character id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical watch page URL for this reference.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }

    /// The highest-resolution thumbnail URL for this reference.
    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", self.0)
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a remote stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    /// Video track only, needs an audio companion and a merge.
    VideoOnly,
    /// Audio track only.
    AudioOnly,
    /// Progressive stream holding both tracks, playable as-is.
    Combined,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::VideoOnly => write!(f, "video-only"),
            StreamKind::AudioOnly => write!(f, "audio-only"),
            StreamKind::Combined => write!(f, "combined"),
        }
    }
}

/// One remote media stream, as advertised by a provider catalog.
///
/// Immutable once resolved; the selector only reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Provider-side stream identifier.
    pub id: String,
    /// What the stream carries.
    pub kind: StreamKind,
    /// Container name as reported by the provider, e.g. `MPEG_4` or `WEBM`.
    pub container: String,
    /// Frame width in pixels, when known.
    pub width: Option<u32>,
    /// Frame height in pixels, when known.
    pub height: Option<u32>,
    /// Bitrate in bits per second. The selection key for audio streams.
    pub bitrate: Option<u64>,
    /// Human-readable quality label, e.g. `720p` or `128kbps`.
    pub quality_label: String,
    /// The remote URL the stream can be fetched from.
    pub url: String,
}

impl StreamDescriptor {
    /// Whether the container is MP4-like.
    pub fn is_mp4(&self) -> bool {
        let container = self.container.to_ascii_lowercase();
        container == "mpeg_4" || container == "mp4" || container == "m4a"
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stream(id = {}, kind = {}, container = {}, quality = {})",
            self.id, self.kind, self.container, self.quality_label
        )
    }
}

/// The full list of remote streams available for a video, with the metadata
/// the final [`MediaResult`] is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// The id of the resolved video.
    pub reference: String,
    /// The video title.
    pub title: String,
    /// The video duration in seconds, as reported by the provider.
    pub duration_seconds: u64,
    /// The available streams, in provider order.
    pub streams: Vec<StreamDescriptor>,
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Catalog(reference = {}, title = \"{}\", streams = {})",
            self.reference,
            self.title,
            self.streams.len()
        )
    }
}

/// A downloaded stream on the local file system.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalArtifact {
    /// Where the bytes landed.
    pub path: PathBuf,
    /// Whether the file is a single-use intermediate owned by the pipeline.
    pub temporary: bool,
}

/// The pipeline's sole output: a locally playable file and its dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaResult {
    /// The local path of the playable MP4.
    pub path: PathBuf,
    /// The duration in seconds, taken from the catalog (video timing is
    /// never re-encoded).
    pub duration_seconds: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl fmt::Display for MediaResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MediaResult(path = {:?}, {}x{}, {}s)",
            self.path, self.width, self.height, self.duration_seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_id() {
        let reference = VideoReference::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(reference.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(VideoReference::parse("too-short").is_err());
        assert!(VideoReference::parse("dQw4w9WgXcQ-longer").is_err());
        assert!(VideoReference::parse("dQw4w9WgXc!").is_err());
        assert!(VideoReference::parse("").is_err());
    }

    #[test]
    fn extracts_id_from_known_url_shapes() {
        let urls = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10s",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
        ];

        for url in urls {
            let reference = VideoReference::from_url(url).unwrap();
            assert_eq!(reference.as_str(), "dQw4w9WgXcQ", "from {url}");
        }
    }

    #[test]
    fn unknown_url_shape_is_invalid() {
        let result = VideoReference::from_url("https://example.com/video/123");
        assert!(matches!(result, Err(Error::InvalidReference(_))));
    }

    #[test]
    fn derives_thumbnail_and_watch_urls() {
        let reference = VideoReference::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(
            reference.thumbnail_url(),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
        assert_eq!(
            reference.watch_url(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn mp4_detection_covers_provider_spellings() {
        let mut stream = StreamDescriptor {
            id: "137".to_string(),
            kind: StreamKind::VideoOnly,
            container: "MPEG_4".to_string(),
            width: Some(1920),
            height: Some(1080),
            bitrate: None,
            quality_label: "1080p".to_string(),
            url: String::new(),
        };
        assert!(stream.is_mp4());

        stream.container = "WEBM".to_string();
        assert!(!stream.is_mp4());
    }
}
