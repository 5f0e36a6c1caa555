//! Transfer progress and human-readable formatting

use std::time::{Duration, Instant};

/// Progress of a single transfer
#[derive(Debug, Clone)]
pub struct Progress {
    /// Expected size in bytes (0 when unknown)
    pub total_size: u64,
    /// Bytes written so far
    pub downloaded_size: u64,
    /// Percentage (0.0 to 100.0); stays 0.0 when the total is unknown
    pub percent: f64,
    /// Average speed in bytes per second
    pub speed: Option<f64>,
    /// Estimated time remaining
    pub eta: Option<Duration>,
    /// Time when the transfer started
    pub start_time: Instant,
}

impl Progress {
    /// Start tracking a transfer of `total_size` bytes
    pub fn new(total_size: u64) -> Self {
        Self {
            total_size,
            downloaded_size: 0,
            percent: 0.0,
            speed: None,
            eta: None,
            start_time: Instant::now(),
        }
    }

    /// Record the new byte count and refresh speed/ETA
    pub fn update(&mut self, downloaded_size: u64) {
        self.downloaded_size = downloaded_size;
        // Servers sometimes send more than advertised
        if self.total_size > 0 && downloaded_size > self.total_size {
            self.total_size = downloaded_size;
        }
        self.percent = if self.total_size > 0 {
            (downloaded_size as f64 / self.total_size as f64) * 100.0
        } else {
            0.0
        };

        let elapsed = self.start_time.elapsed();
        if elapsed.as_millis() > 0 {
            let speed = downloaded_size as f64 / elapsed.as_secs_f64();
            self.speed = Some(speed);
            self.eta = if speed > 0.0 && self.total_size > downloaded_size {
                let remaining = self.total_size - downloaded_size;
                Some(Duration::from_secs((remaining as f64 / speed) as u64))
            } else {
                None
            };
        }
    }

    /// Check if transfer is complete
    pub fn is_complete(&self) -> bool {
        self.total_size > 0 && self.downloaded_size >= self.total_size
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exp = (bytes_f64.ln() / THRESHOLD.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);

    let value = bytes_f64 / THRESHOLD.powi(exp as i32);

    if exp == 0 {
        format!("{} {}", bytes, UNITS[exp])
    } else {
        format!("{:.1} {}", value, UNITS[exp])
    }
}

/// Format elapsed time compactly ("1m 30s")
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    if total_seconds < 60 {
        format!("{}s", total_seconds)
    } else if total_seconds < 3600 {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        if seconds == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m {}s", minutes, seconds)
        }
    } else {
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, minutes)
        }
    }
}

/// Format a media length as a clock ("03:25", "01:02:03")
pub fn format_clock(seconds: u64) -> String {
    if seconds == 0 {
        return "Unknown".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Format a count with thousands separators ("1,234,567")
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Shorten text to `max_len` characters, ending with "..." when cut
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_progress_creation() {
        let progress = Progress::new(1000);
        assert_eq!(progress.total_size, 1000);
        assert_eq!(progress.downloaded_size, 0);
        assert_eq!(progress.percent, 0.0);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_progress_update() {
        let mut progress = Progress::new(1000);

        progress.update(500);
        assert_eq!(progress.downloaded_size, 500);
        assert_eq!(progress.percent, 50.0);
        assert!(!progress.is_complete());

        progress.update(1000);
        assert_eq!(progress.percent, 100.0);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_progress_unknown_total() {
        let mut progress = Progress::new(0);
        progress.update(4096);
        assert_eq!(progress.percent, 0.0);
        assert!(!progress.is_complete());
        assert!(progress.eta.is_none());
    }

    #[test]
    fn test_progress_overshoot_grows_total() {
        let mut progress = Progress::new(100);
        progress.update(150);
        assert_eq!(progress.total_size, 150);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_progress_speed_calculation() {
        let mut progress = Progress::new(1000);
        thread::sleep(Duration::from_millis(100));
        progress.update(100);

        assert!(progress.speed.is_some());
        assert!(progress.speed.unwrap() > 0.0);
        assert!(progress.eta.is_some());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(1073741824), "1.0 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h");
        assert_eq!(format_duration(Duration::from_secs(3660)), "1h 1m");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "Unknown");
        assert_eq!(format_clock(5), "00:05");
        assert_eq!(format_clock(205), "03:25");
        assert_eq!(format_clock(3723), "01:02:03");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly ten", 11), "exactly ten");
        assert_eq!(truncate("a very long playlist title", 10), "a very ...");
    }
}
