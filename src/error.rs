//! Error types for tubefetch

use thiserror::Error;

/// Main error type for tubefetch operations
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Could not resolve {url}: {reason}")]
    Resolution { url: String, reason: String },

    #[error("Media resolver unavailable: {0}")]
    ResolverUnavailable(String),

    #[error("Quality {requested} is not available (available: {})", join_heights(.available))]
    QualityUnavailable { requested: u32, available: Vec<u32> },

    #[error("No video stream found")]
    NoVideoStream,

    #[error("No audio stream found")]
    NoAudioStream,

    #[error("Audio conversion unavailable: {0}")]
    TranscodeUnavailable(String),

    #[error("Audio conversion failed: {0}")]
    Transcode(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Download failed: {0}")]
    DownloadFailed(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl FetchError {
    /// Check if error is a transient transfer failure
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::DownloadFailed(_))
    }

    /// Check if error belongs to a single item rather than the whole invocation.
    /// A missing external tool fails every remaining item the same way.
    pub fn is_item_level(&self) -> bool {
        !matches!(
            self,
            FetchError::Usage(_)
                | FetchError::ResolverUnavailable(_)
                | FetchError::TranscodeUnavailable(_)
        )
    }

    /// Shorthand for a resolution failure
    pub fn resolution(url: &str, reason: impl Into<String>) -> Self {
        FetchError::Resolution {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

fn join_heights(heights: &[u32]) -> String {
    if heights.is_empty() {
        return "none".to_string();
    }
    heights
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_unavailable_message() {
        let err = FetchError::QualityUnavailable {
            requested: 480,
            available: vec![144, 720],
        };
        let message = err.to_string();
        assert!(message.contains("480"));
        assert!(message.contains("144, 720"));
    }

    #[test]
    fn test_quality_unavailable_without_streams() {
        let err = FetchError::QualityUnavailable {
            requested: 1080,
            available: vec![],
        };
        assert!(err.to_string().contains("available: none"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(FetchError::Network("reset".to_string()).is_retryable());
        assert!(!FetchError::NoAudioStream.is_retryable());
        assert!(!FetchError::resolution("u", "private video").is_retryable());
        assert!(!FetchError::TranscodeUnavailable("ffmpeg".to_string()).is_retryable());
    }

    #[test]
    fn test_is_item_level() {
        assert!(!FetchError::Usage("bad".to_string()).is_item_level());
        assert!(!FetchError::TranscodeUnavailable("ffmpeg".to_string()).is_item_level());
        assert!(!FetchError::ResolverUnavailable("yt-dlp".to_string()).is_item_level());
        assert!(FetchError::resolution("u", "gone").is_item_level());
        assert!(FetchError::NoAudioStream.is_item_level());
    }

    #[test]
    fn test_resolution_message_names_url() {
        let err = FetchError::resolution("https://youtu.be/abc", "Video unavailable");
        assert_eq!(
            err.to_string(),
            "Could not resolve https://youtu.be/abc: Video unavailable"
        );
    }
}
