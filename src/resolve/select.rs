use crate::resolve::models::{ExtractionResult, Format};

const NONE_CODEC: &str = "none";

/// Audio codec present, video codec exactly `"none"`, non-empty url.
pub fn is_audio_only(format: &Format) -> bool {
    let has_audio = format.acodec.as_deref().is_some_and(|c| c != NONE_CODEC);
    let no_video = format.vcodec.as_deref() == Some(NONE_CODEC);
    let has_url = format.url.as_deref().is_some_and(|u| !u.is_empty());
    has_audio && no_video && has_url
}

/// First audio-only format in extractor order. No quality scoring: yt-dlp
/// already sorts formats by preference.
pub fn first_audio_only(formats: &[Format]) -> Option<&str> {
    formats
        .iter()
        .find(|f| is_audio_only(f))
        .and_then(|f| f.url.as_deref())
}

/// Picks the stream URL in fixed priority order:
/// top-level `url`, then the first entry only, then top-level `formats`.
pub fn select_audio_url(info: &ExtractionResult) -> Option<String> {
    if let Some(url) = non_empty(info.url.as_deref()) {
        return Some(url.to_string());
    }

    if let Some(entry) = info.entries.as_ref().and_then(|e| e.first()) {
        let from_formats = entry.formats.as_deref().and_then(first_audio_only);
        return from_formats
            .or_else(|| non_empty(entry.url.as_deref()))
            .map(str::to_string);
    }

    info.formats
        .as_deref()
        .and_then(first_audio_only)
        .map(str::to_string)
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::models::Entry;

    fn fmt(acodec: Option<&str>, vcodec: Option<&str>, url: &str) -> Format {
        Format {
            format_id: None,
            acodec: acodec.map(str::to_string),
            vcodec: vcodec.map(str::to_string),
            url: Some(url.to_string()),
        }
    }

    #[test]
    fn test_top_level_url_wins() {
        let info = ExtractionResult {
            url: Some("A".to_string()),
            entries: Some(vec![Entry {
                url: Some("X".to_string()),
                formats: Some(vec![fmt(Some("aac"), Some("none"), "Y")]),
                ..Default::default()
            }]),
            formats: Some(vec![fmt(Some("opus"), Some("none"), "Z")]),
            ..Default::default()
        };
        assert_eq!(select_audio_url(&info).as_deref(), Some("A"));
    }

    #[test]
    fn test_first_audio_only_format_of_first_entry() {
        let info = ExtractionResult {
            entries: Some(vec![Entry {
                formats: Some(vec![
                    fmt(Some("aac"), Some("none"), "B"),
                    fmt(Some("aac"), Some("H264"), "C"),
                ]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        assert_eq!(select_audio_url(&info).as_deref(), Some("B"));
    }

    #[test]
    fn test_muxed_format_is_skipped() {
        let info = ExtractionResult {
            entries: Some(vec![Entry {
                formats: Some(vec![
                    fmt(Some("aac"), Some("H264"), "C"),
                    fmt(Some("opus"), Some("none"), "B"),
                ]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        assert_eq!(select_audio_url(&info).as_deref(), Some("B"));
    }

    #[test]
    fn test_entry_url_fallback() {
        let info = ExtractionResult {
            entries: Some(vec![Entry {
                url: Some("D".to_string()),
                formats: Some(vec![]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        assert_eq!(select_audio_url(&info).as_deref(), Some("D"));
    }

    #[test]
    fn test_only_first_entry_is_considered() {
        let info = ExtractionResult {
            entries: Some(vec![
                Entry::default(),
                Entry {
                    url: Some("second".to_string()),
                    formats: Some(vec![fmt(Some("aac"), Some("none"), "second-audio")]),
                    ..Default::default()
                },
            ]),
            formats: Some(vec![fmt(Some("aac"), Some("none"), "top")]),
            ..Default::default()
        };
        assert_eq!(select_audio_url(&info), None);
    }

    #[test]
    fn test_empty_entries_fall_through_to_formats() {
        let info = ExtractionResult {
            entries: Some(vec![]),
            formats: Some(vec![fmt(Some("opus"), Some("none"), "F")]),
            ..Default::default()
        };
        assert_eq!(select_audio_url(&info).as_deref(), Some("F"));
    }

    #[test]
    fn test_no_audio_codec_means_no_url() {
        let info = ExtractionResult {
            formats: Some(vec![fmt(Some("none"), Some("none"), "E")]),
            ..Default::default()
        };
        assert_eq!(select_audio_url(&info), None);
    }

    #[test]
    fn test_audio_only_predicate() {
        assert!(is_audio_only(&fmt(Some("opus"), Some("none"), "u")));
        assert!(!is_audio_only(&fmt(None, Some("none"), "u")));
        // missing vcodec is unknown, not "none"
        assert!(!is_audio_only(&fmt(Some("opus"), None, "u")));
        assert!(!is_audio_only(&fmt(Some("opus"), Some("vp9"), "u")));
        assert!(!is_audio_only(&fmt(Some("opus"), Some("none"), "")));
        let mut no_url = fmt(Some("opus"), Some("none"), "u");
        no_url.url = None;
        assert!(!is_audio_only(&no_url));
    }

    #[test]
    fn test_empty_top_level_url_is_ignored() {
        let info = ExtractionResult {
            url: Some(String::new()),
            formats: Some(vec![fmt(Some("opus"), Some("none"), "G")]),
            ..Default::default()
        };
        assert_eq!(select_audio_url(&info).as_deref(), Some("G"));
    }
}
