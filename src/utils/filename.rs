//! Safe filename generation utilities

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("valid pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid pattern"));

/// Name used when a title sanitizes down to nothing
pub const FALLBACK_NAME: &str = "untitled";

const MAX_STEM_BYTES: usize = 200;

/// Turn a media title into a filesystem-safe file stem
pub fn sanitize_title(title: &str) -> String {
    let stripped = INVALID_CHARS.replace_all(title, "");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    let mut safe = collapsed
        .trim_matches(|c: char| c == '.' || c == ' ')
        .to_string();

    if safe.len() > MAX_STEM_BYTES {
        let mut cut = MAX_STEM_BYTES;
        while !safe.is_char_boundary(cut) {
            cut -= 1;
        }
        safe.truncate(cut);
        safe = safe.trim_end_matches(|c: char| c == '.' || c == ' ').to_string();
    }

    if safe.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        safe
    }
}

/// Sanitized title plus extension
pub fn to_safe_filename(title: &str, extension: &str) -> String {
    let stem = sanitize_title(title);
    let ext = extension.trim_start_matches('.');
    if ext.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, ext)
    }
}

/// First path in `dir` named `filename` or `stem (n).ext` that does not exist yet
pub fn unique_path(dir: &Path, filename: &str) -> std::io::Result<PathBuf> {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return Ok(candidate);
    }

    let path = Path::new(filename);
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    for counter in 1..=10_000 {
        let candidate = dir.join(format!("{} ({}){}", stem, counter, extension));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        "Too many files with similar names",
    ))
}
