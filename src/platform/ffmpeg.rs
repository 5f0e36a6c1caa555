//! Transcoder backed by the `ffmpeg` executable

use super::Transcoder;
use crate::error::FetchError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

const BINARY_NAME: &str = "ffmpeg";

/// MP3 bitrate used for audio-only downloads
pub const MP3_BITRATE: &str = "192k";

/// ffmpeg backed `Transcoder`
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: Option<PathBuf>,
}

impl FfmpegTranscoder {
    /// Look `ffmpeg` up in PATH when needed
    pub fn new() -> Self {
        Self { binary: None }
    }

    /// Use an explicit executable
    pub fn with_binary(mut self, binary: Option<PathBuf>) -> Self {
        self.binary = binary;
        self
    }

    fn locate(&self) -> Result<PathBuf, FetchError> {
        match &self.binary {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(path) => which::which(path).map_err(|_| {
                FetchError::TranscodeUnavailable(format!("{} not found", path.display()))
            }),
            None => which::which(BINARY_NAME).map_err(|_| {
                FetchError::TranscodeUnavailable(format!(
                    "{} not found in PATH; install it or pass --ffmpeg",
                    BINARY_NAME
                ))
            }),
        }
    }

    fn mp3_args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args = base_args();
        args.push(OsString::from("-i"));
        args.push(input.as_os_str().to_owned());
        args.extend(
            ["-vn", "-codec:a", "libmp3lame", "-b:a", MP3_BITRATE]
                .into_iter()
                .map(OsString::from),
        );
        args.push(output.as_os_str().to_owned());
        args
    }

    fn mux_args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
        let mut args = base_args();
        for input in [video, audio] {
            args.push(OsString::from("-i"));
            args.push(input.as_os_str().to_owned());
        }
        args.extend(
            ["-map", "0:v:0", "-map", "1:a:0", "-c", "copy"]
                .into_iter()
                .map(OsString::from),
        );
        args.push(output.as_os_str().to_owned());
        args
    }

    async fn run(&self, args: Vec<OsString>) -> Result<(), FetchError> {
        let binary = self.locate()?;
        debug!("Running {} {:?}", binary.display(), args);

        let output = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| FetchError::Transcode(format!("could not start {}: {}", BINARY_NAME, e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("no diagnostic output");
        Err(FetchError::Transcode(format!(
            "{} exited with {}: {}",
            BINARY_NAME,
            output.status,
            reason.trim()
        )))
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

fn base_args() -> Vec<OsString> {
    ["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]
        .into_iter()
        .map(OsString::from)
        .collect()
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn check_available(&self) -> Result<(), FetchError> {
        let binary = self.locate()?;
        info!("Using {}", binary.display());
        Ok(())
    }

    async fn to_mp3(&self, input: &Path, output: &Path) -> Result<(), FetchError> {
        info!("Converting {} to MP3 at {}", input.display(), MP3_BITRATE);
        self.run(Self::mp3_args(input, output)).await
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), FetchError> {
        info!("Merging {} and {}", video.display(), audio.display());
        self.run(Self::mux_args(video, audio, output)).await
    }
}
