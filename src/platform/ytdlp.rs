//! Media resolver backed by the `yt-dlp` executable
//!
//! Metadata comes from `yt-dlp --dump-single-json`; the bytes of the chosen
//! stream are then pulled directly over HTTP with the headers yt-dlp reports.

use super::{MediaResolver, ProgressFn};
use crate::core::media::{MediaItem, Playlist, StreamDescriptor, AUDIO_LABEL};
use crate::download::{DownloaderConfig, StreamDownloader};
use crate::error::FetchError;
use crate::utils::mime::mime_from_ext;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

const BINARY_NAME: &str = "yt-dlp";

/// yt-dlp resolver configuration
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Explicit executable path; searched in PATH when absent
    pub binary: Option<PathBuf>,
    /// Upper bound for one metadata invocation
    pub resolve_timeout: Duration,
    /// Network timeout passed to yt-dlp and used for transfers
    pub socket_timeout: Duration,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: None,
            resolve_timeout: Duration::from_secs(120),
            socket_timeout: Duration::from_secs(30),
        }
    }
}

/// yt-dlp backed `MediaResolver`
pub struct YtDlpResolver {
    config: YtDlpConfig,
    downloader: StreamDownloader,
}

impl YtDlpResolver {
    /// Create a resolver with default configuration
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(YtDlpConfig::default())
    }

    /// Create a resolver with configuration
    pub fn with_config(config: YtDlpConfig) -> Result<Self, FetchError> {
        let downloader = StreamDownloader::with_config(DownloaderConfig {
            timeout: config.socket_timeout,
            ..DownloaderConfig::default()
        })?;
        Ok(Self { config, downloader })
    }

    fn locate(&self) -> Result<PathBuf, FetchError> {
        match &self.config.binary {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(path) => which::which(path).map_err(|_| {
                FetchError::ResolverUnavailable(format!("{} not found", path.display()))
            }),
            None => which::which(BINARY_NAME).map_err(|_| {
                FetchError::ResolverUnavailable(format!(
                    "{} not found in PATH; install it or pass --yt-dlp",
                    BINARY_NAME
                ))
            }),
        }
    }

    /// Run yt-dlp and return its stdout, mapping failures to resolution errors
    async fn run_json(&self, url: &str, extra_args: &[&str]) -> Result<Vec<u8>, FetchError> {
        let binary = self.locate()?;
        let mut command = Command::new(&binary);
        command
            .arg("--dump-single-json")
            .arg("--no-warnings")
            .arg("--socket-timeout")
            .arg(self.config.socket_timeout.as_secs().max(1).to_string())
            .args(extra_args)
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("Running {} for {}", binary.display(), url);
        let output = tokio::time::timeout(self.config.resolve_timeout, command.output())
            .await
            .map_err(|_| {
                FetchError::resolution(
                    url,
                    format!(
                        "{} timed out after {}",
                        BINARY_NAME,
                        humantime::format_duration(self.config.resolve_timeout)
                    ),
                )
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} exited with {}: {}", BINARY_NAME, output.status, stderr.trim());
            return Err(FetchError::resolution(url, error_reason(&stderr)));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    fn name(&self) -> &'static str {
        BINARY_NAME
    }

    async fn check_available(&self) -> Result<(), FetchError> {
        let binary = self.locate()?;
        info!("Using {}", binary.display());
        Ok(())
    }

    async fn resolve(&self, url: &str) -> Result<MediaItem, FetchError> {
        let stdout = self.run_json(url, &["--no-playlist"]).await?;
        let video: YtDlpVideo = serde_json::from_slice(&stdout)?;
        let item = video.into_media_item(url);
        debug!(
            "Resolved {} with {} downloadable streams",
            item.id,
            item.available_streams.len()
        );
        Ok(item)
    }

    async fn resolve_playlist(&self, url: &str) -> Result<Playlist, FetchError> {
        let stdout = self.run_json(url, &["--flat-playlist", "--yes-playlist"]).await?;
        let playlist: YtDlpPlaylist = serde_json::from_slice(&stdout)?;
        playlist.into_playlist(url)
    }

    async fn fetch(
        &self,
        stream: &StreamDescriptor,
        destination: &Path,
        progress: &ProgressFn,
    ) -> Result<u64, FetchError> {
        if stream.url.is_empty() {
            return Err(FetchError::Network(format!(
                "format {} has no direct URL",
                stream.format_id
            )));
        }
        self.downloader
            .download(
                &stream.url,
                &stream.http_headers,
                stream.approx_size_bytes,
                destination,
                progress,
            )
            .await
    }
}

/// Pick the most useful line out of yt-dlp's stderr
fn error_reason(stderr: &str) -> String {
    let line = stderr
        .lines()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| stderr.lines().rev().find(|line| !line.trim().is_empty()))
        .unwrap_or("unknown error");

    let line = line.trim_start_matches("ERROR:").trim();
    // "[youtube] dQw4w9WgXcQ: Video unavailable" -> "Video unavailable"
    match line.strip_prefix('[').and_then(|rest| rest.split_once("]: ").or_else(|| {
        rest.split_once("] ")
            .and_then(|(_, tail)| tail.split_once(": "))
    })) {
        Some((_, reason)) if !reason.is_empty() => reason.to_string(),
        _ => line.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpVideo {
    id: String,
    title: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    channel: Option<String>,
    webpage_url: Option<String>,
    view_count: Option<u64>,
    upload_date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
}

impl YtDlpVideo {
    fn into_media_item(self, requested_url: &str) -> MediaItem {
        let available_streams = self
            .formats
            .into_iter()
            .filter_map(YtDlpFormat::into_stream)
            .collect();

        MediaItem {
            title: self.title.unwrap_or_else(|| self.id.clone()),
            duration_seconds: self.duration.map(|d| d.max(0.0).round() as u64).unwrap_or(0),
            channel_name: self.channel.or(self.uploader).unwrap_or_default(),
            webpage_url: self
                .webpage_url
                .unwrap_or_else(|| requested_url.to_string()),
            view_count: self.view_count,
            upload_date: self
                .upload_date
                .and_then(|d| chrono::NaiveDate::parse_from_str(&d, "%Y%m%d").ok()),
            description: self.description,
            available_streams,
            id: self.id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    format_id: String,
    url: Option<String>,
    ext: Option<String>,
    protocol: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<f64>,
    tbr: Option<f64>,
    abr: Option<f64>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    format_note: Option<String>,
    #[serde(default)]
    http_headers: BTreeMap<String, String>,
}

impl YtDlpFormat {
    /// Height of the quality tier YouTube advertises. Ultrawide and vertical
    /// videos report frame sizes like 1920x800 or 1080x1920 for the 1080p tier.
    fn quality_height(&self) -> Option<u32> {
        self.format_note
            .as_deref()
            .and_then(label_height)
            .or(match (self.width, self.height) {
                (Some(width), Some(height)) => Some(width.min(height)),
                (_, height) => height,
            })
    }

    /// Only plain HTTP(S) formats can be streamed directly; manifests and
    /// storyboards are skipped
    fn into_stream(self) -> Option<StreamDescriptor> {
        let quality_height = self.quality_height();
        let protocol = self.protocol.as_deref().unwrap_or("https");
        if protocol != "https" && protocol != "http" {
            return None;
        }
        let url = self.url?;
        let ext = self.ext.unwrap_or_else(|| "mp4".to_string());
        if ext == "mhtml" {
            return None;
        }

        let has_codec = |codec: &Option<String>| {
            codec
                .as_deref()
                .map_or(false, |c| !c.is_empty() && c != "none")
        };
        let has_video = has_codec(&self.vcodec) || (self.vcodec.is_none() && self.height.is_some());
        let has_audio = has_codec(&self.acodec);
        if !has_video && !has_audio {
            return None;
        }

        let mut mime_type = mime_from_ext(&ext).to_string();
        if !has_video {
            if let Some(container) = mime_type.strip_prefix("video/") {
                mime_type = format!("audio/{}", container);
            }
        }

        let height = quality_height.filter(|_| has_video);
        let resolution_label = match (has_video, height) {
            (true, Some(height)) => format!("{}p", height),
            (true, None) => self.format_note.unwrap_or_else(|| "unknown".to_string()),
            (false, _) => AUDIO_LABEL.to_string(),
        };

        Some(StreamDescriptor {
            format_id: self.format_id,
            resolution_label,
            height,
            approx_size_bytes: self
                .filesize
                .or(self.filesize_approx)
                .map(|s| s.max(0.0) as u64)
                .unwrap_or(0),
            mime_type,
            fps: self.fps,
            bitrate_kbps: if has_video { self.tbr } else { self.abr.or(self.tbr) },
            has_video,
            has_audio,
            url,
            http_headers: self.http_headers,
        })
    }
}

/// Leading height of a quality label such as `1080p60` or `720p HDR`
fn label_height(note: &str) -> Option<u32> {
    let digits = note.find(|c: char| !c.is_ascii_digit())?;
    if digits == 0 || !note[digits..].starts_with('p') {
        return None;
    }
    note[..digits].parse().ok()
}

#[derive(Debug, Deserialize)]
struct YtDlpPlaylist {
    #[serde(rename = "_type")]
    kind: Option<String>,
    id: String,
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    description: Option<String>,
    #[serde(default)]
    entries: Vec<Option<YtDlpEntry>>,
}

impl YtDlpPlaylist {
    fn into_playlist(self, requested_url: &str) -> Result<Playlist, FetchError> {
        if self.kind.as_deref() != Some("playlist") {
            return Err(FetchError::resolution(requested_url, "not a playlist"));
        }

        let total = self.entries.len();
        let entries: Vec<String> = self
            .entries
            .into_iter()
            .flatten()
            .filter_map(YtDlpEntry::watch_url)
            .collect();
        if entries.len() < total {
            warn!(
                "Skipped {} unavailable playlist entries",
                total - entries.len()
            );
        }

        Ok(Playlist {
            title: self.title.unwrap_or_else(|| self.id.clone()),
            channel_name: self.channel.or(self.uploader).unwrap_or_default(),
            description: self.description,
            entries,
            id: self.id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    id: Option<String>,
    url: Option<String>,
}

impl YtDlpEntry {
    fn watch_url(self) -> Option<String> {
        match (self.url, self.id) {
            (Some(url), _) if url.starts_with("http") => Some(url),
            (_, Some(id)) => Some(format!("https://www.youtube.com/watch?v={}", id)),
            _ => None,
        }
    }
}
