//! # tubefetch - YouTube video, audio and playlist downloader
//!
//! Resolves YouTube URLs with `yt-dlp`, picks a stream according to a simple
//! quality policy, streams it to disk and optionally converts it to MP3 with
//! `ffmpeg`.
//!
//! ## Features
//!
//! - Exact or best-available quality selection
//! - Audio-only downloads transcoded to MP3
//! - Playlists processed in order, with per-entry failure reporting
//! - Atomic writes (`.part` files renamed on completion)
//! - Opt-in retries for network failures
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tubefetch::platform::{FfmpegTranscoder, YtDlpResolver};
//! use tubefetch::{Downloader, Quality};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Downloader::new(
//!         Arc::new(YtDlpResolver::new()?),
//!         Arc::new(FfmpegTranscoder::new()),
//!     )
//!     .with_quality(Some(Quality::P720))
//!     .with_output_dir("./videos");
//!
//!     let (item, path) = downloader.download("https://youtu.be/dQw4w9WgXcQ").await?;
//!     println!("Downloaded {} to {}", item.title, path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod download;
pub mod error;
pub mod platform;
pub mod utils;

// Re-export main types
pub use crate::core::{
    Action, BatchSummary, DownloadEvent, DownloadOptions, DownloadRequest, DownloadResult,
    Downloader, MediaItem, Mode, Playlist, Progress, Quality, StreamDescriptor,
};
pub use error::FetchError;

/// Result type alias for tubefetch operations
pub type Result<T> = std::result::Result<T, FetchError>;
