//! External collaborators: media resolution and transcoding
//!
//! The retrieval core only talks to these traits. Production code uses the
//! `yt-dlp` backed resolver and the `ffmpeg` backed transcoder; tests plug in
//! fakes.

pub mod ffmpeg;
pub mod ytdlp;

pub use ffmpeg::FfmpegTranscoder;
pub use ytdlp::YtDlpResolver;

use crate::core::media::{MediaItem, Playlist, StreamDescriptor};
use crate::core::progress::Progress;
use crate::error::FetchError;
use async_trait::async_trait;
use std::path::Path;

/// Progress sink invoked for every received chunk
pub type ProgressFn = dyn Fn(Progress) + Send + Sync;

/// Turns URLs into media metadata and performs byte transfers
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Verify the backend can run at all
    async fn check_available(&self) -> Result<(), FetchError> {
        Ok(())
    }

    /// Resolve a single video URL
    async fn resolve(&self, url: &str) -> Result<MediaItem, FetchError>;

    /// Resolve a playlist URL to its ordered entries
    async fn resolve_playlist(&self, url: &str) -> Result<Playlist, FetchError>;

    /// Write the stream's bytes to `destination`, returning the byte count
    async fn fetch(
        &self,
        stream: &StreamDescriptor,
        destination: &Path,
        progress: &ProgressFn,
    ) -> Result<u64, FetchError>;
}

/// Converts and combines media containers
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Fails with `TranscodeUnavailable` when the external tool is missing
    async fn check_available(&self) -> Result<(), FetchError>;

    /// Encode `input` as MP3 into `output`
    async fn to_mp3(&self, input: &Path, output: &Path) -> Result<(), FetchError>;

    /// Combine a video-only and an audio-only file without re-encoding
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), FetchError>;
}
