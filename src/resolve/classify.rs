use std::fmt;

/// yt-dlp search directive prepended to anything that isn't an http(s) URL.
pub const SEARCH_PREFIX: &str = "ytsearch:";

/// String handed to the extractor: the query itself or a search directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractionTarget(String);

impl ExtractionTarget {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_search(&self) -> bool {
        self.0.starts_with(SEARCH_PREFIX)
    }
}

impl fmt::Display for ExtractionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Syntactic prefix check only. No trimming, no URL parsing: `ftp://...`
/// or `HTTPS://...` are searched for like any other text.
pub fn classify(query: &str) -> ExtractionTarget {
    if is_url(query) {
        ExtractionTarget(query.to_string())
    } else {
        ExtractionTarget(format!("{SEARCH_PREFIX}{query}"))
    }
}

fn is_url(query: &str) -> bool {
    query.starts_with("http://") || query.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_pass_through() {
        for q in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://example.com/a.mp3",
            "https://",
            "https://not a url at all",
        ] {
            let t = classify(q);
            assert_eq!(t.as_str(), q);
            assert!(!t.is_search());
        }
    }

    #[test]
    fn test_everything_else_is_search() {
        assert_eq!(classify("never gonna give you up").as_str(), "ytsearch:never gonna give you up");
        assert_eq!(classify("ftp://example.com/song").as_str(), "ytsearch:ftp://example.com/song");
        assert_eq!(classify("HTTPS://example.com").as_str(), "ytsearch:HTTPS://example.com");
        assert_eq!(classify("www.youtube.com/watch?v=x").as_str(), "ytsearch:www.youtube.com/watch?v=x");
        assert!(classify("lofi").is_search());
    }

    #[test]
    fn test_no_trimming() {
        assert_eq!(classify(" https://example.com").as_str(), "ytsearch: https://example.com");
        assert_eq!(classify("lofi ").to_string(), "ytsearch:lofi ");
    }
}
