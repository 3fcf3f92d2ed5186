use serde::{Deserialize, Serialize};

/// Title used when neither the result nor its first entry carries one.
pub const UNKNOWN_TITLE: &str = "Unknown title";

/// Subset of the `--dump-single-json` document we care about.
///
/// Every field is optional: a single video carries `url` or `formats`,
/// a search or playlist carries `entries`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: Option<String>,
    pub url: Option<String>,
    pub entries: Option<Vec<Entry>>,
    pub formats: Option<Vec<Format>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub title: Option<String>,
    pub url: Option<String>,
    pub formats: Option<Vec<Format>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Format {
    pub format_id: Option<String>,
    pub acodec: Option<String>,
    pub vcodec: Option<String>,
    pub url: Option<String>,
}

impl ExtractionResult {
    /// Top-level title, then the first entry's title.
    pub fn title(&self) -> String {
        self.title
            .as_deref()
            .or_else(|| {
                self.entries
                    .as_ref()
                    .and_then(|e| e.first())
                    .and_then(|e| e.title.as_deref())
            })
            .unwrap_or(UNKNOWN_TITLE)
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStream {
    pub title: String,
    pub audio_url: Option<String>,
}
