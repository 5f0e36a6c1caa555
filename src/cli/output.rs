//! Output formatting and progress display

use crate::cli::args::VerbosityLevel;
use crate::core::downloader::DownloadEvent;
use crate::core::media::{BatchSummary, MediaItem};
use crate::core::progress::{
    format_bytes, format_clock, format_duration, format_number, truncate, Progress,
};
use crate::core::selector::listing;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Failure reasons listed under a verbose playlist summary
const MAX_LISTED_FAILURES: usize = 5;

/// Output formatter for tubefetch
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
    show_progress: bool,
    multi: MultiProgress,
    transfer_bar: Mutex<Option<ProgressBar>>,
    playlist_bar: Mutex<Option<ProgressBar>>,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel, show_progress: bool) -> Self {
        let multi = MultiProgress::new();
        if !show_progress || verbosity == VerbosityLevel::Quiet {
            multi.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self {
            verbosity,
            show_progress: show_progress && verbosity != VerbosityLevel::Quiet,
            multi,
            transfer_bar: Mutex::new(None),
            playlist_bar: Mutex::new(None),
        }
    }

    fn is_quiet(&self) -> bool {
        self.verbosity == VerbosityLevel::Quiet
    }

    /// Print above any live progress bars
    fn stdout(&self, line: String) {
        self.multi.suspend(|| println!("{}", line));
    }

    fn stderr(&self, line: String) {
        self.multi.suspend(|| eprintln!("{}", line));
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if !self.is_quiet() {
            self.stdout(message.cyan().to_string());
        }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if !self.is_quiet() {
            self.stdout(format!("✓ {}", message).green().to_string());
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if !self.is_quiet() {
            self.stderr(format!("⚠ {}", message).yellow().to_string());
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        self.stderr(format!("✗ {}", message).red().to_string());
    }

    /// Print debug message
    pub fn debug(&self, message: &str) {
        if self.verbosity == VerbosityLevel::Verbose {
            self.stdout(message.dimmed().to_string());
        }
    }

    /// React to one retrieval event
    pub fn handle_event(&self, event: DownloadEvent) {
        match event {
            DownloadEvent::Resolving { url } => self.info(&format!("Fetching video info: {}", url)),
            DownloadEvent::Resolved(item) => self.print_media_info(&item),
            DownloadEvent::StreamSelected(stream) => self.info(&format!(
                "Selected {} ({}, {})",
                stream.resolution_label,
                stream.extension(),
                stream.size_string()
            )),
            DownloadEvent::TransferStarted { label, total_bytes } => {
                self.start_transfer(&label, total_bytes)
            }
            DownloadEvent::Transfer(progress) => self.update_progress(&progress),
            DownloadEvent::TransferFinished { bytes } => {
                self.finish_transfer();
                self.debug(&format!("Received {}", format_bytes(bytes)));
            }
            DownloadEvent::Transcoding => self.info("Converting to MP3..."),
            DownloadEvent::Muxing => self.info("Merging video and audio..."),
            DownloadEvent::Warning(message) => self.warning(&message),
            DownloadEvent::PlaylistResolved {
                title,
                channel,
                total,
            } => self.start_playlist(&title, &channel, total),
            DownloadEvent::PlaylistEntry {
                position,
                total,
                url,
            } => {
                self.info(&format!("[{}/{}] {}", position, total, url));
            }
            DownloadEvent::ItemFinished {
                position,
                total,
                result,
            } => {
                if let Some(bar) = lock(&self.playlist_bar).as_ref() {
                    bar.set_position(position as u64);
                }
                match (&result.output_path, &result.error_message) {
                    (Some(path), _) => self.success(&format!(
                        "[{}/{}] Saved to {}",
                        position,
                        total,
                        display_path(path).display()
                    )),
                    (None, reason) => self.error(&format!(
                        "[{}/{}] {}: {}",
                        position,
                        total,
                        result.display_name(),
                        reason.as_deref().unwrap_or("unknown error")
                    )),
                }
            }
        }
    }

    fn start_transfer(&self, label: &str, total_bytes: u64) {
        if !self.show_progress {
            return;
        }
        let bar = self.multi.add(ProgressBar::new(total_bytes));
        bar.set_style(transfer_style(total_bytes > 0));
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        if let Some(previous) = lock(&self.transfer_bar).replace(bar) {
            previous.finish_and_clear();
        }
    }

    /// Update progress bar
    pub fn update_progress(&self, progress: &Progress) {
        if let Some(bar) = lock(&self.transfer_bar).as_ref() {
            if progress.total_size > 0 && bar.length() != Some(progress.total_size) {
                bar.set_length(progress.total_size);
                bar.set_style(transfer_style(true));
            }
            bar.set_position(progress.downloaded_size);
            bar.set_message(transfer_stats(progress));
        }
    }

    fn finish_transfer(&self) {
        if let Some(bar) = lock(&self.transfer_bar).take() {
            bar.finish_and_clear();
        }
    }

    fn start_playlist(&self, title: &str, channel: &str, total: usize) {
        if !self.is_quiet() {
            self.stdout(format!("Playlist: {}", truncate(title, 60)).cyan().bold().to_string());
            self.info(&format!("Total videos: {}", total));
            if !channel.is_empty() {
                self.info(&format!("Channel: {}", channel));
            }
        }
        if self.show_progress && total > 0 {
            let bar = self.multi.add(ProgressBar::new(total as u64));
            bar.set_style(
                ProgressStyle::with_template("{prefix:.bold} [{bar:30.green/white}] {pos}/{len}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            bar.set_prefix("Playlist");
            *lock(&self.playlist_bar) = Some(bar);
        }
    }

    /// Print video information
    pub fn print_media_info(&self, item: &MediaItem) {
        if self.is_quiet() {
            return;
        }
        self.stdout(format!("Title: {}", truncate(&item.title, 60)).bold().to_string());
        if !item.channel_name.is_empty() {
            self.info(&format!("Channel: {}", item.channel_name));
        }
        self.info(&format!("Duration: {}", format_clock(item.duration_seconds)));

        if self.verbosity == VerbosityLevel::Verbose {
            if let Some(views) = item.view_count {
                self.info(&format!("Views: {}", format_number(views)));
            }
            if let Some(date) = item.upload_date {
                self.info(&format!("Uploaded: {}", date.format("%Y-%m-%d")));
            }
            if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
                self.info(&format!(
                    "Description: {}",
                    truncate(&description.replace('\n', " "), 100)
                ));
            }
        }
    }

    /// Print the `--list-quality` table; shown even in quiet mode
    pub fn print_quality_table(&self, item: &MediaItem) {
        for line in quality_table(item) {
            self.stdout(line);
        }
    }

    /// Print single download completion
    pub fn print_download_complete(&self, path: &Path, elapsed: Duration) {
        self.finish_transfer();
        self.success(&format!("Saved to {}", display_path(path).display()));
        self.debug(&format!("Finished in {}", format_duration(elapsed)));
    }

    /// Print the playlist summary; the totals line is shown even in quiet mode
    pub fn print_batch_summary(&self, summary: &BatchSummary, elapsed: Duration) {
        if let Some(bar) = lock(&self.playlist_bar).take() {
            bar.finish_and_clear();
        }
        let lines = summary_lines(summary, self.verbosity == VerbosityLevel::Verbose);
        let (last, details) = match lines.split_last() {
            Some(split) => split,
            None => return,
        };
        if !self.is_quiet() {
            self.stdout(String::new());
            for line in details {
                self.stdout(line.clone());
            }
            self.debug(&format!("Finished in {}", format_duration(elapsed)));
        }
        let last = if summary.is_complete_success() {
            last.green().bold()
        } else {
            last.red().bold()
        };
        self.stdout(last.to_string());
    }

    /// Remove any bars still on screen
    pub fn clear(&self) {
        self.finish_transfer();
        if let Some(bar) = lock(&self.playlist_bar).take() {
            bar.finish_and_clear();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn transfer_style(known_length: bool) -> ProgressStyle {
    let template = if known_length {
        "{spinner:.green} {prefix:>6} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}"
    } else {
        "{spinner:.green} {prefix:>6} [{elapsed_precise}] {bytes} {msg}"
    };
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Percentage, speed and ETA shown after the byte counts
fn transfer_stats(progress: &Progress) -> String {
    let mut parts = Vec::new();
    if progress.total_size > 0 {
        parts.push(format!("{:.0}%", progress.percent));
    }
    if let Some(speed) = progress.speed {
        parts.push(format!("{}/s", format_bytes(speed as u64)));
    }
    if progress.is_complete() {
        parts.push("done".to_string());
    } else if let Some(eta) = progress.eta {
        parts.push(format!("ETA {}", format_duration(eta)));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("({})", parts.join(", "))
    }
}

/// Path relative to the working directory when that is shorter to read
pub fn display_path(path: &Path) -> PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd))
        .filter(|relative| !relative.as_os_str().is_empty() && !relative.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
}

/// Rows of the quality table, header first
pub fn quality_table(item: &MediaItem) -> Vec<String> {
    let (rows, progressive_only) = listing(item);
    let mut lines = Vec::with_capacity(rows.len() + 3);

    lines.push(format!("Available qualities for: {}", truncate(&item.title, 60)));
    if rows.is_empty() {
        lines.push("No downloadable streams found".to_string());
        return lines;
    }
    if !progressive_only {
        lines.push("(no progressive streams; video rows carry no audio)".to_string());
    }
    lines.push(format!(
        "{:<12} {:>5} {:>12} {:<6} {}",
        "Resolution", "FPS", "Size", "Ext", "Progressive"
    ));
    for stream in rows {
        lines.push(format!(
            "{:<12} {:>5} {:>12} {:<6} {}",
            stream.resolution_label,
            stream.fps_string(),
            stream.size_string(),
            stream.extension(),
            if stream.is_progressive() { "yes" } else { "no" }
        ));
    }
    lines
}

/// Summary lines; the last line is always "X/Y succeeded"
pub fn summary_lines(summary: &BatchSummary, verbose: bool) -> Vec<String> {
    let mut lines = vec![
        format!("Downloaded: {}", summary.succeeded()),
        format!("Failed: {}", summary.failed()),
    ];
    if verbose && summary.failed() > 0 {
        lines.push("Failures:".to_string());
        for (position, result) in summary.failures().take(MAX_LISTED_FAILURES) {
            lines.push(format!(
                "  #{} {}: {}",
                position,
                truncate(result.display_name(), 60),
                result.error_message.as_deref().unwrap_or("unknown error")
            ));
        }
        let hidden = summary.failed().saturating_sub(MAX_LISTED_FAILURES);
        if hidden > 0 {
            lines.push(format!("  ... and {} more", hidden));
        }
    }
    lines.push(summary.summary_line());
    lines
}
