//! The errors that can occur.

use std::time::Duration;
use thiserror::Error;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The possible errors that can occur.
///
/// The pipeline orchestrator decides retry-vs-surface by pattern matching on
/// this closed set of kinds, never on raw provider message text.
#[derive(Debug, Error)]
pub enum Error {
    /// The supplied video reference does not match a known URL or id shape.
    #[error("Invalid video reference: {0}")]
    InvalidReference(String),
    /// The provider reported the video missing, private or region-blocked.
    #[error("Video unavailable: {0}")]
    VideoUnavailable(String),
    /// A transport-level provider failure (5xx, throttling, connection loss).
    #[error("Provider error: {message}")]
    Provider {
        /// The raw HTTP status, when the failure came with one.
        status: Option<u16>,
        /// The underlying message, kept for diagnostics.
        message: String,
    },
    /// The catalog carries no stream combination the selector can use.
    #[error("No suitable format: {0}")]
    NoSuitableFormat(String),
    /// A stream transfer failed mid-flight.
    #[error("Stream transfer failed: {0}")]
    Transfer(String),
    /// The remux subprocess reported an error.
    #[error("Failed to merge streams: {0}")]
    Mux(String),
    /// Both the primary and the secondary provider attempts failed.
    #[error("Both providers failed; primary: {primary}; secondary: {secondary}")]
    Fallback {
        primary: Box<Error>,
        secondary: Box<Error>,
    },

    /// An error occurred while interacting with the file system.
    #[error("An IO error occurred: {0}")]
    Io(#[from] std::io::Error),
    /// An error occurred while talking HTTP.
    #[error("An error occurred while fetching: {0}")]
    Http(#[from] reqwest::Error),
    /// An error occurred while parsing JSON.
    #[error("An error occurred while parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// An error occurred due to a timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    /// An error occurred manipulating a path.
    #[error("An invalid path was provided: {0}")]
    Path(String),
    /// An error occurred while running a command.
    #[error("Failed to execute command: {0}")]
    Command(String),
}

impl Error {
    /// Whether the orchestrator may retry the whole pipeline against the
    /// fallback provider after this failure.
    ///
    /// `InvalidReference` and `VideoUnavailable` are terminal: a second
    /// provider would answer the same. `Mux` and `Timeout` are terminal too,
    /// since both come from the remux subprocess and its inputs would not
    /// change on a retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Provider { .. }
                | Error::NoSuitableFormat(_)
                | Error::Transfer(_)
                | Error::Http(_)
        )
    }

    /// The pipeline stage this error belongs to, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::InvalidReference(_) => "reference",
            Error::VideoUnavailable(_) | Error::Provider { .. } => "resolve",
            Error::NoSuitableFormat(_) => "select",
            Error::Transfer(_) | Error::Http(_) => "fetch",
            Error::Mux(_) | Error::Command(_) | Error::Timeout(_) => "mux",
            Error::Fallback { .. } => "fallback",
            _ => "pipeline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_kinds_allow_fallback() {
        let recoverable = [
            Error::Provider {
                status: Some(503),
                message: "service unavailable".to_string(),
            },
            Error::NoSuitableFormat("no combined stream".to_string()),
            Error::Transfer("connection reset".to_string()),
        ];
        for error in recoverable {
            assert!(error.is_recoverable(), "{error} should be recoverable");
        }
    }

    #[test]
    fn terminal_kinds_skip_fallback() {
        let terminal = [
            Error::InvalidReference("not-an-id".to_string()),
            Error::VideoUnavailable("private video".to_string()),
            Error::Mux("ffmpeg exited with code 1".to_string()),
            Error::Timeout(Duration::from_secs(300)),
        ];
        for error in terminal {
            assert!(!error.is_recoverable(), "{error} should be terminal");
        }
    }

    #[test]
    fn fallback_error_aggregates_both_messages() {
        let error = Error::Fallback {
            primary: Box::new(Error::Provider {
                status: Some(429),
                message: "throttled".to_string(),
            }),
            secondary: Box::new(Error::VideoUnavailable("gone".to_string())),
        };

        let message = error.to_string();
        assert!(message.contains("throttled"));
        assert!(message.contains("gone"));
    }
}
