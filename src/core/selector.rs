//! Stream selection policy

use crate::core::media::{MediaItem, StreamDescriptor};
use crate::core::request::Quality;
use crate::error::FetchError;
use std::cmp::Ordering;

/// Select the video stream for the requested quality.
///
/// With an explicit quality only streams labeled exactly `{height}p` qualify;
/// progressive streams win over video-only ones, then the larger file wins.
/// Without a quality the highest resolution wins, tie-broken by size.
pub fn select_video_stream(
    item: &MediaItem,
    quality: Option<Quality>,
) -> Result<&StreamDescriptor, FetchError> {
    match quality {
        Some(quality) => {
            let label = quality.label();
            item.video_streams()
                .filter(|s| s.resolution_label == label)
                .max_by(|a, b| {
                    a.has_audio
                        .cmp(&b.has_audio)
                        .then(a.approx_size_bytes.cmp(&b.approx_size_bytes))
                })
                .ok_or_else(|| FetchError::QualityUnavailable {
                    requested: quality.height(),
                    available: item.available_heights(),
                })
        }
        None => item
            .video_streams()
            .max_by(|a, b| {
                a.height
                    .unwrap_or(0)
                    .cmp(&b.height.unwrap_or(0))
                    .then(a.approx_size_bytes.cmp(&b.approx_size_bytes))
            })
            .ok_or(FetchError::NoVideoStream),
    }
}

/// Select the best audio-only stream: highest bitrate, then largest size
pub fn select_audio_stream(item: &MediaItem) -> Result<&StreamDescriptor, FetchError> {
    item.audio_streams()
        .max_by(|a, b| compare_audio(a, b))
        .ok_or(FetchError::NoAudioStream)
}

fn compare_audio(a: &StreamDescriptor, b: &StreamDescriptor) -> Ordering {
    let a_rate = a.bitrate_kbps.unwrap_or(0.0);
    let b_rate = b.bitrate_kbps.unwrap_or(0.0);
    a_rate
        .partial_cmp(&b_rate)
        .unwrap_or(Ordering::Equal)
        .then(a.approx_size_bytes.cmp(&b.approx_size_bytes))
}

/// Streams to show for `--list-quality`: progressive first if any exist,
/// otherwise everything; highest resolution first, one row per resolution
/// (audio rows are never collapsed)
pub fn listing(item: &MediaItem) -> (Vec<&StreamDescriptor>, bool) {
    let progressive: Vec<&StreamDescriptor> = item
        .available_streams
        .iter()
        .filter(|s| s.is_progressive())
        .collect();
    let progressive_only = !progressive.is_empty();

    let mut streams = if progressive_only {
        progressive
    } else {
        item.available_streams.iter().collect()
    };
    streams.sort_by(|a, b| b.height.unwrap_or(0).cmp(&a.height.unwrap_or(0)));

    let mut shown: Vec<&str> = Vec::new();
    let mut rows = Vec::with_capacity(streams.len());
    for stream in streams {
        if stream.has_video {
            if shown.contains(&stream.resolution_label.as_str()) {
                continue;
            }
            shown.push(stream.resolution_label.as_str());
        }
        rows.push(stream);
    }

    (rows, progressive_only)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with(streams: Vec<StreamDescriptor>) -> MediaItem {
        let mut item = MediaItem::new("video123", "Video 123");
        item.available_streams = streams;
        item
    }

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_exact_quality_selects_matching_descriptor() {
        for quality in Quality::ALL {
            let streams = Quality::ALL
                .iter()
                .map(|q| {
                    StreamDescriptor::video(format!("f{}", q.height()), q.height(), 1000, "video/mp4")
                })
                .collect();
            let item = item_with(streams);
            let selected = select_video_stream(&item, Some(quality)).unwrap();
            assert_eq!(selected.resolution_label, quality.label());
            assert_eq!(selected.format_id, format!("f{}", quality.height()));
        }
    }

    #[test]
    fn test_missing_quality_fails_without_fallback() {
        let item = item_with(vec![
            StreamDescriptor::video("160", 144, 5 * MB, "video/mp4"),
            StreamDescriptor::video("136", 720, 80 * MB, "video/mp4"),
        ]);
        let err = select_video_stream(&item, Some(Quality::P480)).unwrap_err();
        match &err {
            FetchError::QualityUnavailable {
                requested,
                available,
            } => {
                assert_eq!(*requested, 480);
                assert_eq!(available, &vec![144, 720]);
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("480"));
        assert!(message.contains("144, 720"));
    }

    #[test]
    fn test_best_quality_without_preference() {
        let item = item_with(vec![
            StreamDescriptor::video("160", 144, 5 * MB, "video/mp4"),
            StreamDescriptor::video("136", 720, 80 * MB, "video/mp4"),
            StreamDescriptor::video("137", 1080, 200 * MB, "video/mp4"),
        ]);
        let selected = select_video_stream(&item, None).unwrap();
        assert_eq!(selected.resolution_label, "1080p");
        assert_eq!(selected.approx_size_bytes, 200 * MB);
    }

    #[test]
    fn test_best_quality_tie_breaks_by_size() {
        let item = item_with(vec![
            StreamDescriptor::video("248", 1080, 150 * MB, "video/webm"),
            StreamDescriptor::video("137", 1080, 200 * MB, "video/mp4"),
            StreamDescriptor::audio("140", 300 * MB, "audio/mp4"),
        ]);
        let selected = select_video_stream(&item, None).unwrap();
        assert_eq!(selected.format_id, "137");
    }

    #[test]
    fn test_exact_quality_prefers_progressive() {
        let item = item_with(vec![
            StreamDescriptor::video("134", 360, 40 * MB, "video/mp4"),
            StreamDescriptor::video("18", 360, 20 * MB, "video/mp4").with_audio(),
        ]);
        let selected = select_video_stream(&item, Some(Quality::P360)).unwrap();
        assert_eq!(selected.format_id, "18");
    }

    #[test]
    fn test_audio_only_items_have_no_video_stream() {
        let item = item_with(vec![StreamDescriptor::audio("140", MB, "audio/mp4")]);
        assert!(select_video_stream(&item, None).is_err());
    }

    #[test]
    fn test_select_audio_stream_by_bitrate() {
        let item = item_with(vec![
            StreamDescriptor::audio("139", 2 * MB, "audio/mp4").with_bitrate(48.0),
            StreamDescriptor::audio("251", 3 * MB, "audio/webm").with_bitrate(160.0),
            StreamDescriptor::audio("140", 4 * MB, "audio/mp4").with_bitrate(128.0),
            StreamDescriptor::video("18", 360, 20 * MB, "video/mp4").with_audio(),
        ]);
        let selected = select_audio_stream(&item).unwrap();
        assert_eq!(selected.format_id, "251");
    }

    #[test]
    fn test_select_audio_stream_missing() {
        let item = item_with(vec![StreamDescriptor::video("18", 360, MB, "video/mp4").with_audio()]);
        assert!(matches!(
            select_audio_stream(&item),
            Err(FetchError::NoAudioStream)
        ));
    }

    #[test]
    fn test_listing_prefers_progressive() {
        let item = item_with(vec![
            StreamDescriptor::video("18", 360, MB, "video/mp4").with_audio(),
            StreamDescriptor::video("22", 720, MB, "video/mp4").with_audio(),
            StreamDescriptor::video("137", 1080, MB, "video/mp4"),
        ]);
        let (streams, progressive_only) = listing(&item);
        assert!(progressive_only);
        let labels: Vec<&str> = streams.iter().map(|s| s.resolution_label.as_str()).collect();
        assert_eq!(labels, vec!["720p", "360p"]);
    }

    #[test]
    fn test_listing_dedupes_resolutions_but_keeps_audio() {
        let item = item_with(vec![
            StreamDescriptor::video("136", 720, MB, "video/mp4"),
            StreamDescriptor::video("247", 720, MB, "video/webm"),
            StreamDescriptor::audio("140", MB, "audio/mp4"),
            StreamDescriptor::audio("251", MB, "audio/webm"),
        ]);
        let (streams, progressive_only) = listing(&item);
        assert!(!progressive_only);
        let ids: Vec<&str> = streams.iter().map(|s| s.format_id.as_str()).collect();
        assert_eq!(ids, vec!["136", "140", "251"]);
    }
}
