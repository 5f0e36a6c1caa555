//! Command line argument parsing

use crate::core::request::{Action, DownloadRequest, Mode, Quality};
use crate::error::FetchError;
use crate::utils::url::{
    is_playlist_page, is_playlist_url, is_supported_url, is_video_url, normalize_url,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// tubefetch - download YouTube videos, audio tracks and playlists
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// YouTube video, shorts or playlist URL
    pub url: String,

    /// Download the best audio stream and convert it to MP3
    #[arg(short, long)]
    pub audio_only: bool,

    /// Video resolution to download (best available when omitted)
    #[arg(long, value_enum, value_name = "HEIGHT")]
    pub quality: Option<Quality>,

    /// List available qualities and exit without downloading
    #[arg(short, long)]
    pub list_quality: bool,

    /// Download the whole list a watch URL belongs to (playlist pages need no flag)
    #[arg(short, long)]
    pub playlist: bool,

    /// Output directory (default: videos/ or audio/)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet output (only errors and the playlist summary)
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Max items to process for playlist (0 means all)
    #[arg(long, default_value = "0")]
    pub limit: usize,

    /// Pause between playlist entries (e.g., 500ms, 2s)
    #[arg(long, value_name = "DURATION", default_value = "500ms")]
    pub delay: humantime::Duration,

    /// Network timeout (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION", default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Extra attempts for transfers interrupted by network errors
    #[arg(long, default_value = "0")]
    pub retries: u32,

    /// Path to the yt-dlp executable
    #[arg(long = "yt-dlp", value_name = "PATH", env = "TUBEFETCH_YTDLP")]
    pub yt_dlp: Option<PathBuf>,

    /// Path to the ffmpeg executable
    #[arg(long, value_name = "PATH", env = "TUBEFETCH_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            url: String::new(),
            audio_only: false,
            quality: None,
            list_quality: false,
            playlist: false,
            output: None,
            verbose: false,
            quiet: false,
            no_progress: false,
            limit: 0,
            delay: humantime::Duration::from(Duration::from_millis(500)),
            timeout: humantime::Duration::from(Duration::from_secs(30)),
            retries: 0,
            yt_dlp: None,
            ffmpeg: None,
        }
    }
}

impl Args {
    /// Validate the parsed flags into a request
    pub fn to_request(&self) -> Result<DownloadRequest, FetchError> {
        let url = normalize_url(&self.url);
        if self.url.trim().is_empty() || !is_supported_url(&url) {
            return Err(FetchError::Usage(format!(
                "'{}' is not a YouTube video or playlist URL",
                self.url
            )));
        }

        let mode = if self.audio_only {
            Mode::AudioOnly
        } else {
            Mode::Video
        };
        let action = if self.list_quality {
            Action::ListQualities
        } else {
            Action::Download
        };

        let is_playlist = match action {
            // A video opened from inside a list stays a single video unless asked
            Action::Download => {
                is_playlist_page(&url) || (self.playlist && is_playlist_url(&url))
            }
            // Listing works on one video; a watch URL inside a playlist lists that video
            Action::ListQualities if is_video_url(&url) => false,
            Action::ListQualities => {
                return Err(FetchError::Usage(
                    "--list-quality needs a single video URL".to_string(),
                ))
            }
        };

        Ok(DownloadRequest::new(
            url,
            mode,
            self.quality,
            action,
            is_playlist,
            self.output.clone(),
        ))
    }

    /// `--playlist` was given for a URL that carries no playlist
    pub fn playlist_flag_ignored(&self) -> bool {
        self.playlist && !is_playlist_url(&normalize_url(&self.url))
    }

    /// Get network timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    /// Get playlist delay as Duration
    pub fn delay_duration(&self) -> Duration {
        self.delay.into()
    }

    /// Playlist entry limit; `None` means all
    pub fn playlist_limit(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit)
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}
