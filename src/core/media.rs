//! Media metadata and per-item results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Label used for streams without a video track
pub const AUDIO_LABEL: &str = "audio";

/// Resolved metadata for one playable video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    /// Platform video ID
    pub id: String,
    /// Video title
    pub title: String,
    /// Duration in seconds
    pub duration_seconds: u64,
    /// Channel / uploader name
    pub channel_name: String,
    /// Canonical watch URL
    pub webpage_url: String,
    /// View count (if known)
    pub view_count: Option<u64>,
    /// Upload date (if known)
    pub upload_date: Option<chrono::NaiveDate>,
    /// Description
    pub description: Option<String>,
    /// Downloadable variants in resolver order
    pub available_streams: Vec<StreamDescriptor>,
}

impl MediaItem {
    /// Create a new MediaItem
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            duration_seconds: 0,
            channel_name: String::new(),
            webpage_url: String::new(),
            view_count: None,
            upload_date: None,
            description: None,
            available_streams: Vec::new(),
        }
    }

    /// Streams that carry a video track
    pub fn video_streams(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.available_streams.iter().filter(|s| s.has_video)
    }

    /// Streams that carry only audio
    pub fn audio_streams(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.available_streams.iter().filter(|s| s.is_audio_only())
    }

    /// Distinct video heights, ascending
    pub fn available_heights(&self) -> Vec<u32> {
        let mut heights: Vec<u32> = self.video_streams().filter_map(|s| s.height).collect();
        heights.sort_unstable();
        heights.dedup();
        heights
    }
}

/// One downloadable quality/format variant of a MediaItem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Resolver format ID
    pub format_id: String,
    /// Resolution label ("720p") or "audio"
    pub resolution_label: String,
    /// Video height in pixels
    pub height: Option<u32>,
    /// Approximate size in bytes (0 when unknown)
    pub approx_size_bytes: u64,
    /// MIME type (e.g. "video/mp4")
    pub mime_type: String,
    /// Frame rate
    pub fps: Option<f64>,
    /// Total bitrate in kbit/s
    pub bitrate_kbps: Option<f64>,
    /// Carries a video track
    pub has_video: bool,
    /// Carries an audio track
    pub has_audio: bool,
    /// Direct media URL
    pub url: String,
    /// Headers the resolver requires for the transfer
    #[serde(default)]
    pub http_headers: BTreeMap<String, String>,
}

impl StreamDescriptor {
    /// Create a video stream descriptor for the given height
    pub fn video(format_id: impl Into<String>, height: u32, size: u64, mime_type: &str) -> Self {
        Self {
            format_id: format_id.into(),
            resolution_label: format!("{}p", height),
            height: Some(height),
            approx_size_bytes: size,
            mime_type: mime_type.to_string(),
            fps: None,
            bitrate_kbps: None,
            has_video: true,
            has_audio: false,
            url: String::new(),
            http_headers: BTreeMap::new(),
        }
    }

    /// Create an audio-only stream descriptor
    pub fn audio(format_id: impl Into<String>, size: u64, mime_type: &str) -> Self {
        Self {
            format_id: format_id.into(),
            resolution_label: AUDIO_LABEL.to_string(),
            height: None,
            approx_size_bytes: size,
            mime_type: mime_type.to_string(),
            fps: None,
            bitrate_kbps: None,
            has_video: false,
            has_audio: true,
            url: String::new(),
            http_headers: BTreeMap::new(),
        }
    }

    /// Mark the stream as carrying audio too
    pub fn with_audio(mut self) -> Self {
        self.has_audio = true;
        self
    }

    /// Set the direct URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the bitrate
    pub fn with_bitrate(mut self, kbps: f64) -> Self {
        self.bitrate_kbps = Some(kbps);
        self
    }

    /// Video and audio in a single file
    pub fn is_progressive(&self) -> bool {
        self.has_video && self.has_audio
    }

    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }

    /// File extension derived from the MIME type
    pub fn extension(&self) -> &'static str {
        crate::utils::mime::ext_from_mime(&self.mime_type)
    }

    /// Get human-readable size string
    pub fn size_string(&self) -> String {
        if self.approx_size_bytes > 0 {
            crate::core::progress::format_bytes(self.approx_size_bytes)
        } else {
            "Unknown".to_string()
        }
    }

    /// Get human-readable frame rate string
    pub fn fps_string(&self) -> String {
        match self.fps {
            Some(fps) if fps > 0.0 => format!("{}", fps.round() as u32),
            _ => "N/A".to_string(),
        }
    }
}

/// Resolved playlist with ordered entry URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    /// Playlist ID
    pub id: String,
    /// Playlist title
    pub title: String,
    /// Owning channel
    pub channel_name: String,
    /// Description
    pub description: Option<String>,
    /// Entry URLs in playlist order
    pub entries: Vec<String>,
}

/// Outcome of one attempted video
#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// URL the attempt was made for
    pub url: String,
    /// Resolved metadata; absent when resolution failed
    pub item: Option<MediaItem>,
    /// Final file location on success
    pub output_path: Option<PathBuf>,
    pub succeeded: bool,
    pub error_message: Option<String>,
}

impl DownloadResult {
    /// Successful attempt
    pub fn success(url: impl Into<String>, item: MediaItem, output_path: PathBuf) -> Self {
        Self {
            url: url.into(),
            item: Some(item),
            output_path: Some(output_path),
            succeeded: true,
            error_message: None,
        }
    }

    /// Failed attempt
    pub fn failure(url: impl Into<String>, item: Option<MediaItem>, error: impl ToString) -> Self {
        Self {
            url: url.into(),
            item,
            output_path: None,
            succeeded: false,
            error_message: Some(error.to_string()),
        }
    }

    /// Title if known, otherwise the URL
    pub fn display_name(&self) -> &str {
        self.item
            .as_ref()
            .map(|item| item.title.as_str())
            .unwrap_or(&self.url)
    }
}

/// Aggregate report after processing a batch
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// One result per attempted entry, in playlist order
    pub results: Vec<DownloadResult>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: DownloadResult) {
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// Failed results with their 1-based playlist positions
    pub fn failures(&self) -> impl Iterator<Item = (usize, &DownloadResult)> {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.succeeded)
            .map(|(i, r)| (i + 1, r))
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }

    /// The "X/Y succeeded" line
    pub fn summary_line(&self) -> String {
        format!("{}/{} succeeded", self.succeeded(), self.total())
    }
}
