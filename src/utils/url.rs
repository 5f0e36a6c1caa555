//! URL utilities for recognizing YouTube video and playlist URLs

use crate::error::FetchError;
use url::Url;

const HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

/// Prepend `https://` when the scheme is missing
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

fn parse_youtube(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(&normalize_url(url))?;
    match parsed.host_str() {
        Some(host) if HOSTS.contains(&host) => Ok(parsed),
        _ => Err(FetchError::Usage(format!(
            "Not a YouTube URL: {}",
            url
        ))),
    }
}

/// Extract video ID from watch, youtu.be, shorts and embed URLs
pub fn extract_video_id(url: &str) -> Result<String, FetchError> {
    let parsed = parse_youtube(url)?;
    let path = parsed.path();

    let id = if parsed.host_str() == Some("youtu.be") {
        path.trim_start_matches('/').split('/').next().map(str::to_string)
    } else if path.starts_with("/watch") {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.to_string())
    } else {
        ["/shorts/", "/embed/", "/live/"]
            .iter()
            .find_map(|prefix| path.strip_prefix(prefix))
            .and_then(|rest| rest.split('/').next())
            .map(str::to_string)
    };

    id.filter(|id| !id.is_empty())
        .ok_or_else(|| FetchError::Usage(format!("No video ID in URL: {}", url)))
}

/// Extract the `list` parameter of a playlist URL
pub fn extract_playlist_id(url: &str) -> Result<String, FetchError> {
    parse_youtube(url)?
        .query_pairs()
        .find(|(key, value)| key == "list" && !value.is_empty())
        .map(|(_, value)| value.to_string())
        .ok_or_else(|| FetchError::Usage(format!("No playlist ID in URL: {}", url)))
}

/// Check if URL points at a single YouTube video
pub fn is_video_url(url: &str) -> bool {
    extract_video_id(url).is_ok()
}

/// Check if URL carries a playlist
pub fn is_playlist_url(url: &str) -> bool {
    extract_playlist_id(url).is_ok()
}

/// Check if URL is a playlist page (`/playlist?list=...`) rather than a
/// video watched from inside a list
pub fn is_playlist_page(url: &str) -> bool {
    match parse_youtube(url) {
        Ok(parsed) => parsed.path() == "/playlist" && is_playlist_url(url),
        Err(_) => false,
    }
}

/// Check if URL is anything this tool can process
pub fn is_supported_url(url: &str) -> bool {
    is_video_url(url) || is_playlist_url(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("youtube.com/watch?v=abc"),
            "https://youtube.com/watch?v=abc"
        );
        assert_eq!(normalize_url(" https://youtu.be/abc "), "https://youtu.be/abc");
        assert_eq!(normalize_url("http://youtu.be/abc"), "http://youtu.be/abc");
    }

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=10").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/brZCOVlyPPo").unwrap(),
            "brZCOVlyPPo"
        );
        assert_eq!(
            extract_video_id("www.youtube.com/watch?v=dQw4w9WgXcQ&t=10s").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://YOUTU.BE/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );

        assert!(extract_video_id("https://youtu.be/").is_err());
        assert!(extract_video_id("https://www.youtube.com/watch").is_err());
        assert!(extract_video_id("https://www.youtube.com/channel/UCxxx").is_err());
        assert!(extract_video_id("https://example.com/watch?v=abc").is_err());
    }

    #[test]
    fn test_extract_playlist_id() {
        assert_eq!(
            extract_playlist_id("https://www.youtube.com/playlist?list=PLxxxx").unwrap(),
            "PLxxxx"
        );
        assert_eq!(
            extract_playlist_id("https://www.youtube.com/watch?v=xxx&list=PLxxxx&index=1").unwrap(),
            "PLxxxx"
        );
        assert!(extract_playlist_id("https://www.youtube.com/watch?v=xxx").is_err());
        assert!(extract_playlist_id("https://www.youtube.com/playlist?list=").is_err());
    }

    #[test]
    fn test_is_supported_url() {
        assert!(is_supported_url("https://www.youtube.com/watch?v=xxx"));
        assert!(is_supported_url("youtu.be/xxx"));
        assert!(is_supported_url("https://music.youtube.com/playlist?list=PLx"));
        assert!(!is_supported_url("https://vimeo.com/123"));
        assert!(!is_supported_url("not a url"));
        assert!(!is_supported_url(""));
    }

    #[test]
    fn test_is_playlist_url() {
        assert!(is_playlist_url("https://www.youtube.com/playlist?list=PLxxxx"));
        assert!(is_playlist_url("https://www.youtube.com/watch?v=xxx&list=PLxxxx"));
        assert!(!is_playlist_url("https://www.youtube.com/watch?v=xxx"));
        assert!(!is_playlist_url("https://example.com/?list=PLxxxx"));
    }

    #[test]
    fn test_is_playlist_page() {
        assert!(is_playlist_page("https://www.youtube.com/playlist?list=PLxxxx"));
        assert!(is_playlist_page("music.youtube.com/playlist?list=PLxxxx"));
        assert!(!is_playlist_page("https://www.youtube.com/watch?v=xxx&list=RDxxx"));
        assert!(!is_playlist_page("https://www.youtube.com/playlist?list="));
        assert!(!is_playlist_page("https://example.com/playlist?list=PLxxxx"));
    }
}
