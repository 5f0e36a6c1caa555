//! Retrieval client: resolve, select, fetch and post-process

use crate::core::media::{BatchSummary, DownloadResult, MediaItem, StreamDescriptor};
use crate::core::progress::Progress;
use crate::core::request::{DownloadRequest, Mode, Quality};
use crate::core::selector::{select_audio_stream, select_video_stream};
use crate::download::{RetryConfig, RetryExecutor};
use crate::error::FetchError;
use crate::platform::{MediaResolver, Transcoder};
use crate::utils::filename::{to_safe_filename, unique_path};
use crate::utils::mime::muxed_extension;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause between consecutive playlist entries
pub const DEFAULT_PLAYLIST_DELAY: Duration = Duration::from_millis(500);

/// Main downloader configuration
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Video container or MP3
    pub mode: Mode,
    /// Requested quality; `None` picks the best available
    pub quality: Option<Quality>,
    /// Directory receiving finished files
    pub output_dir: PathBuf,
    /// Pause between playlist entries
    pub playlist_delay: Duration,
    /// Only process the first N playlist entries
    pub playlist_limit: Option<usize>,
    /// Additional attempts for failed transfers
    pub max_retries: u32,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Video,
            quality: None,
            output_dir: PathBuf::from(Mode::Video.default_directory()),
            playlist_delay: DEFAULT_PLAYLIST_DELAY,
            playlist_limit: None,
            max_retries: 0,
        }
    }
}

/// Something the presentation layer may want to show
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Resolving { url: String },
    Resolved(MediaItem),
    StreamSelected(StreamDescriptor),
    TransferStarted { label: String, total_bytes: u64 },
    Transfer(Progress),
    TransferFinished { bytes: u64 },
    Transcoding,
    Muxing,
    Warning(String),
    PlaylistResolved { title: String, channel: String, total: usize },
    PlaylistEntry { position: usize, total: usize, url: String },
    ItemFinished { position: usize, total: usize, result: DownloadResult },
}

/// Receiver for download events
pub type EventSink = Arc<dyn Fn(DownloadEvent) + Send + Sync>;

/// How the selected streams become one output file
enum Plan {
    Direct(StreamDescriptor),
    Mux {
        video: StreamDescriptor,
        audio: StreamDescriptor,
    },
    Mp3(StreamDescriptor),
}

/// Main downloader struct
pub struct Downloader {
    resolver: Arc<dyn MediaResolver>,
    transcoder: Arc<dyn Transcoder>,
    options: DownloadOptions,
    events: EventSink,
}

impl Downloader {
    /// Create a downloader with default options and no event receiver
    pub fn new(resolver: Arc<dyn MediaResolver>, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            resolver,
            transcoder,
            options: DownloadOptions::default(),
            events: Arc::new(|_: DownloadEvent| {}),
        }
    }

    /// Take mode, quality and output directory from a validated request
    pub fn with_request(mut self, request: &DownloadRequest) -> Self {
        self.options.mode = request.mode();
        self.options.quality = request.quality();
        self.options.output_dir = request.output_directory().to_path_buf();
        self
    }

    /// Set output mode
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Set requested quality
    pub fn with_quality(mut self, quality: Option<Quality>) -> Self {
        self.options.quality = quality;
        self
    }

    /// Set output directory
    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.output_dir = path.into();
        self
    }

    /// Set pause between playlist entries
    pub fn with_playlist_delay(mut self, delay: Duration) -> Self {
        self.options.playlist_delay = delay;
        self
    }

    /// Limit the number of playlist entries processed
    pub fn with_playlist_limit(mut self, limit: Option<usize>) -> Self {
        self.options.playlist_limit = limit;
        self
    }

    /// Set maximum retries for transfers
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.options.max_retries = max_retries;
        self
    }

    /// Set event receiver
    pub fn with_events(mut self, events: impl Fn(DownloadEvent) + Send + Sync + 'static) -> Self {
        self.events = Arc::new(events);
        self
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    fn emit(&self, event: DownloadEvent) {
        (self.events)(event);
    }

    /// Resolve metadata without touching the filesystem
    pub async fn resolve(&self, url: &str) -> Result<MediaItem, FetchError> {
        self.emit(DownloadEvent::Resolving {
            url: url.to_string(),
        });
        let item = self.resolver.resolve(url).await?;
        info!("Resolved \"{}\" ({} streams)", item.title, item.available_streams.len());
        self.emit(DownloadEvent::Resolved(item.clone()));
        Ok(item)
    }

    /// Resolve metadata for `--list-quality`; never writes anything
    pub async fn list_qualities(&self, url: &str) -> Result<MediaItem, FetchError> {
        self.resolve(url).await
    }

    /// Download a single video and return its metadata and final path
    pub async fn download(&self, url: &str) -> Result<(MediaItem, PathBuf), FetchError> {
        let item = self.resolve(url).await?;
        let path = self.fetch_item(&item).await?;
        Ok((item, path))
    }

    /// Download every playlist entry in order; entry failures are recorded.
    /// Resolving the playlist itself and tool-level failures abort the batch.
    pub async fn download_playlist(&self, url: &str) -> Result<BatchSummary, FetchError> {
        let playlist = self.resolver.resolve_playlist(url).await?;
        let mut entries = playlist.entries;
        if let Some(limit) = self.options.playlist_limit {
            entries.truncate(limit);
        }
        let total = entries.len();
        info!("Playlist \"{}\" with {} entries", playlist.title, total);
        self.emit(DownloadEvent::PlaylistResolved {
            title: playlist.title,
            channel: playlist.channel_name,
            total,
        });

        let mut summary = BatchSummary::new();
        for (index, entry) in entries.into_iter().enumerate() {
            if index > 0 && !self.options.playlist_delay.is_zero() {
                tokio::time::sleep(self.options.playlist_delay).await;
            }
            let position = index + 1;
            self.emit(DownloadEvent::PlaylistEntry {
                position,
                total,
                url: entry.clone(),
            });

            let result = match self.resolve(&entry).await {
                Err(e) if !e.is_item_level() => return Err(e),
                Err(e) => DownloadResult::failure(&entry, None, e),
                Ok(item) => match self.fetch_item(&item).await {
                    Ok(path) => DownloadResult::success(&entry, item, path),
                    Err(e) if !e.is_item_level() => return Err(e),
                    Err(e) => DownloadResult::failure(&entry, Some(item), e),
                },
            };
            if let Some(reason) = &result.error_message {
                warn!("Entry {}/{} failed: {}", position, total, reason);
            }

            self.emit(DownloadEvent::ItemFinished {
                position,
                total,
                result: result.clone(),
            });
            summary.push(result);
        }

        Ok(summary)
    }

    /// Pick streams and decide how they turn into a file. Runs every check
    /// that can fail without network transfer.
    async fn plan(&self, item: &MediaItem) -> Result<Plan, FetchError> {
        match self.options.mode {
            Mode::AudioOnly => {
                let audio = select_audio_stream(item)?.clone();
                self.transcoder.check_available().await?;
                self.emit(DownloadEvent::StreamSelected(audio.clone()));
                Ok(Plan::Mp3(audio))
            }
            Mode::Video => {
                let video = select_video_stream(item, self.options.quality)?.clone();
                self.emit(DownloadEvent::StreamSelected(video.clone()));
                if video.has_audio {
                    return Ok(Plan::Direct(video));
                }

                let Ok(audio) = select_audio_stream(item) else {
                    self.warn("No audio stream available; keeping video without sound");
                    return Ok(Plan::Direct(video));
                };
                match self.transcoder.check_available().await {
                    Ok(()) => Ok(Plan::Mux {
                        video,
                        audio: audio.clone(),
                    }),
                    Err(e) => {
                        self.warn(&format!("{}; keeping video without sound", e));
                        Ok(Plan::Direct(video))
                    }
                }
            }
        }
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
        self.emit(DownloadEvent::Warning(message.to_string()));
    }

    async fn fetch_item(&self, item: &MediaItem) -> Result<PathBuf, FetchError> {
        let plan = self.plan(item).await?;

        let dir = &self.options.output_dir;
        tokio::fs::create_dir_all(dir).await?;

        match plan {
            Plan::Direct(stream) => {
                let dest = unique_path(dir, &to_safe_filename(&item.title, stream.extension()))?;
                self.fetch_atomic(&stream, &dest).await?;
                Ok(dest)
            }
            Plan::Mux { video, audio } => {
                let ext = muxed_extension(&video.mime_type, &audio.mime_type);
                let scratch = scratch_dir(dir)?;
                let video_path = scratch.path().join(format!("video.{}", video.extension()));
                let audio_path = scratch.path().join(format!("audio.{}", audio.extension()));
                let muxed_path = scratch.path().join(format!("muxed.{}", ext));

                self.fetch_retrying(&video, &video_path).await?;
                self.fetch_retrying(&audio, &audio_path).await?;
                self.emit(DownloadEvent::Muxing);
                self.transcoder
                    .mux(&video_path, &audio_path, &muxed_path)
                    .await?;

                let dest = unique_path(dir, &to_safe_filename(&item.title, ext))?;
                tokio::fs::rename(&muxed_path, &dest).await?;
                Ok(dest)
            }
            Plan::Mp3(audio) => {
                let scratch = scratch_dir(dir)?;
                let source = scratch.path().join(format!("source.{}", audio.extension()));
                let converted = scratch.path().join("converted.mp3");

                self.fetch_retrying(&audio, &source).await?;
                self.emit(DownloadEvent::Transcoding);
                self.transcoder.to_mp3(&source, &converted).await?;

                let dest = unique_path(dir, &to_safe_filename(&item.title, "mp3"))?;
                tokio::fs::rename(&converted, &dest).await?;
                Ok(dest)
            }
        }
    }

    /// Transfer into `<dest>.part` and rename once complete
    async fn fetch_atomic(&self, stream: &StreamDescriptor, dest: &Path) -> Result<(), FetchError> {
        let mut part = dest.as_os_str().to_owned();
        part.push(".part");
        let part = PathBuf::from(part);

        if let Err(e) = self.fetch_retrying(stream, &part).await {
            if let Err(cleanup) = tokio::fs::remove_file(&part).await {
                debug!("Could not remove {}: {}", part.display(), cleanup);
            }
            return Err(e);
        }
        tokio::fs::rename(&part, dest).await?;
        info!("Saved {}", dest.display());
        Ok(())
    }

    async fn fetch_retrying(&self, stream: &StreamDescriptor, dest: &Path) -> Result<u64, FetchError> {
        let retry = RetryExecutor::with_config(RetryConfig::with_max_retries(
            self.options.max_retries,
        ));
        retry.execute(|| self.transfer(stream, dest)).await
    }

    async fn transfer(&self, stream: &StreamDescriptor, dest: &Path) -> Result<u64, FetchError> {
        debug!(
            "Fetching format {} via {} into {}",
            stream.format_id,
            self.resolver.name(),
            dest.display()
        );
        self.emit(DownloadEvent::TransferStarted {
            label: stream.resolution_label.clone(),
            total_bytes: stream.approx_size_bytes,
        });
        let events = self.events.clone();
        let on_progress = move |progress: Progress| events(DownloadEvent::Transfer(progress));
        let bytes = self.resolver.fetch(stream, dest, &on_progress).await?;
        self.emit(DownloadEvent::TransferFinished { bytes });
        Ok(bytes)
    }
}

/// Private directory next to the output, removed on drop
fn scratch_dir(dir: &Path) -> Result<tempfile::TempDir, FetchError> {
    Ok(tempfile::Builder::new()
        .prefix(".tubefetch-")
        .tempdir_in(dir)?)
}
