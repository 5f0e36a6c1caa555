//! MIME type helpers for picking file extensions

/// Get file extension from MIME type
pub fn ext_from_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/3gpp" => "3gp",
        "video/x-flv" => "flv",
        "video/x-matroska" => "mkv",

        "audio/mp4" => "m4a",
        "audio/webm" => "webm",
        "audio/mpeg" => "mp3",
        "audio/ogg" => "ogg",
        "audio/aac" => "aac",
        "audio/opus" => "opus",

        _ => "bin",
    }
}

/// Get MIME type from a container extension as reported by the resolver
pub fn mime_from_ext(extension: &str) -> &'static str {
    let ext = extension.trim_start_matches('.').to_lowercase();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "3gp" => "video/3gpp",
        "flv" => "video/x-flv",
        "mkv" => "video/x-matroska",

        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "aac" => "audio/aac",
        "opus" => "audio/opus",

        _ => "application/octet-stream",
    }
}

/// Container family shared by the video and audio flavours of a MIME type
pub fn container_of(mime_type: &str) -> &'static str {
    match mime_type {
        "video/mp4" | "audio/mp4" => "mp4",
        "video/webm" | "audio/webm" => "webm",
        "video/3gpp" => "3gp",
        "video/x-matroska" => "mkv",
        _ => "unknown",
    }
}

/// Extension for the file produced by muxing a video-only and an audio-only
/// stream. Matching containers are kept, anything else goes into Matroska.
pub fn muxed_extension(video_mime: &str, audio_mime: &str) -> &'static str {
    match (container_of(video_mime), container_of(audio_mime)) {
        ("mp4", "mp4") => "mp4",
        ("webm", "webm") => "webm",
        _ => "mkv",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("video/mp4"), "mp4");
        assert_eq!(ext_from_mime("video/webm"), "webm");
        assert_eq!(ext_from_mime("audio/mp4"), "m4a");
        assert_eq!(ext_from_mime("audio/webm"), "webm");
        assert_eq!(ext_from_mime("audio/mpeg"), "mp3");
        assert_eq!(ext_from_mime("unknown/type"), "bin");
    }

    #[test]
    fn test_mime_from_ext() {
        assert_eq!(mime_from_ext("mp4"), "video/mp4");
        assert_eq!(mime_from_ext(".webm"), "video/webm");
        assert_eq!(mime_from_ext("MP4"), "video/mp4");
        assert_eq!(mime_from_ext("m4a"), "audio/mp4");
        assert_eq!(mime_from_ext("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_muxed_extension() {
        assert_eq!(muxed_extension("video/mp4", "audio/mp4"), "mp4");
        assert_eq!(muxed_extension("video/webm", "audio/webm"), "webm");
        assert_eq!(muxed_extension("video/mp4", "audio/webm"), "mkv");
        assert_eq!(muxed_extension("video/webm", "audio/mp4"), "mkv");
        assert_eq!(muxed_extension("video/x-flv", "audio/mp4"), "mkv");
    }
}
