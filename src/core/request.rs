//! Validated download requests

use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default output folder for video downloads
pub const DEFAULT_VIDEO_DIR: &str = "videos";
/// Default output folder for audio-only downloads
pub const DEFAULT_AUDIO_DIR: &str = "audio";

/// Supported video resolutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum Quality {
    #[value(name = "144")]
    P144,
    #[value(name = "240")]
    P240,
    #[value(name = "360")]
    P360,
    #[value(name = "480")]
    P480,
    #[value(name = "720")]
    P720,
    #[value(name = "1080")]
    P1080,
}

impl Quality {
    /// All supported qualities, lowest first
    pub const ALL: [Quality; 6] = [
        Quality::P144,
        Quality::P240,
        Quality::P360,
        Quality::P480,
        Quality::P720,
        Quality::P1080,
    ];

    /// Vertical resolution in pixels
    pub fn height(self) -> u32 {
        match self {
            Quality::P144 => 144,
            Quality::P240 => 240,
            Quality::P360 => 360,
            Quality::P480 => 480,
            Quality::P720 => 720,
            Quality::P1080 => 1080,
        }
    }

    /// Resolution label as reported by stream descriptors (e.g. "720p")
    pub fn label(self) -> String {
        format!("{}p", self.height())
    }

    /// Look up a quality by pixel height
    pub fn from_height(height: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.height() == height)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.height())
    }
}

/// What kind of file a download produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Video container as offered by the resolver
    Video,
    /// Best audio stream transcoded to MP3
    AudioOnly,
}

impl Mode {
    /// Folder used when no explicit output directory is given
    pub fn default_directory(self) -> &'static str {
        match self {
            Mode::Video => DEFAULT_VIDEO_DIR,
            Mode::AudioOnly => DEFAULT_AUDIO_DIR,
        }
    }
}

/// What the invocation should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Fetch the media and write it to disk
    Download,
    /// Print the available streams and exit without writing anything
    ListQualities,
}

/// Immutable description of one invocation's work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: String,
    mode: Mode,
    quality: Option<Quality>,
    action: Action,
    is_playlist: bool,
    output_directory: PathBuf,
}

impl DownloadRequest {
    /// Create a request; `output_directory` falls back to the mode's default folder
    pub fn new(
        url: impl Into<String>,
        mode: Mode,
        quality: Option<Quality>,
        action: Action,
        is_playlist: bool,
        output_directory: Option<PathBuf>,
    ) -> Self {
        let output_directory =
            output_directory.unwrap_or_else(|| PathBuf::from(mode.default_directory()));
        Self {
            url: url.into(),
            mode,
            quality,
            action,
            is_playlist,
            output_directory,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Requested quality; `None` means best available
    pub fn quality(&self) -> Option<Quality> {
        self.quality
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn is_playlist(&self) -> bool {
        self.is_playlist
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_heights_and_labels() {
        assert_eq!(Quality::P144.height(), 144);
        assert_eq!(Quality::P1080.height(), 1080);
        assert_eq!(Quality::P720.label(), "720p");
        assert_eq!(Quality::P480.to_string(), "480");
    }

    #[test]
    fn test_quality_from_height() {
        for quality in Quality::ALL {
            assert_eq!(Quality::from_height(quality.height()), Some(quality));
        }
        assert_eq!(Quality::from_height(1440), None);
    }

    #[test]
    fn test_quality_value_enum_names() {
        assert_eq!(Quality::from_str("360", false), Ok(Quality::P360));
        assert!(Quality::from_str("999", false).is_err());
    }

    #[test]
    fn test_default_output_directory_per_mode() {
        let video = DownloadRequest::new("u", Mode::Video, None, Action::Download, false, None);
        assert_eq!(video.output_directory(), Path::new("videos"));

        let audio = DownloadRequest::new("u", Mode::AudioOnly, None, Action::Download, false, None);
        assert_eq!(audio.output_directory(), Path::new("audio"));
    }

    #[test]
    fn test_explicit_output_directory_overrides_default() {
        let request = DownloadRequest::new(
            "u",
            Mode::AudioOnly,
            None,
            Action::Download,
            false,
            Some(PathBuf::from("/tmp/music")),
        );
        assert_eq!(request.output_directory(), Path::new("/tmp/music"));
    }
}
