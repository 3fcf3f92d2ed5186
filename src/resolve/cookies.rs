use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How the cookie file reaches yt-dlp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieMode {
    /// Hand the file to `--cookies` untouched.
    #[default]
    File,
    /// Parse it as Netscape and send a `Cookie:` header.
    Header,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub domain: String,
    pub path: String,
    pub name: String,
    pub value: String,
    pub secure: bool,
    pub expires_utc: Option<i64>,
}

/// Authentication attached to one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAuth {
    File(PathBuf),
    Header(String),
}

#[derive(Debug, Error)]
pub enum CookieError {
    #[error("cookie file {path} is unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cookie file {path} is not a regular file")]
    NotAFile { path: PathBuf },

    #[error("cookie file {path} has no Netscape cookie lines")]
    NoCookies { path: PathBuf },
}

/// Netscape format: domain \t flag \t path \t secure \t expiration \t name \t value.
/// Comment lines, blank lines and lines with fewer than seven fields are skipped.
pub fn parse_netscape(raw: &str) -> Vec<Cookie> {
    let mut cookies = Vec::new();

    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 7 {
            tracing::debug!(fields = parts.len(), "skipping malformed cookie line");
            continue;
        }

        cookies.push(Cookie {
            domain: parts[0].to_string(),
            path: parts[2].to_string(),
            secure: parts[3].eq_ignore_ascii_case("TRUE"),
            expires_utc: parts[4].parse::<i64>().ok(),
            name: parts[5].to_string(),
            value: parts[6].to_string(),
        });
    }

    cookies
}

pub fn cookie_header(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Loads the cookie file for one resolution.
///
/// A missing file is not an error: extraction just runs unauthenticated.
/// In both modes the file must be UTF-8 Netscape text with at least one
/// cookie, since yt-dlp rejects anything else and fails the whole run.
pub fn load(path: &Path, mode: CookieMode) -> Result<Option<CookieAuth>, CookieError> {
    if !path.exists() {
        return Ok(None);
    }
    let unreadable = |source: io::Error| CookieError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let meta = std::fs::metadata(path).map_err(unreadable)?;
    if !meta.is_file() {
        return Err(CookieError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(path).map_err(unreadable)?;
    let cookies = parse_netscape(&raw);
    if cookies.is_empty() {
        return Err(CookieError::NoCookies {
            path: path.to_path_buf(),
        });
    }

    match mode {
        CookieMode::File => Ok(Some(CookieAuth::File(path.to_path_buf()))),
        CookieMode::Header => Ok(Some(CookieAuth::Header(cookie_header(&cookies)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "# Netscape HTTP Cookie File\n\
        # This is a generated file!  Do not edit.\n\
        \n\
        .youtube.com\tTRUE\t/\tTRUE\t1767225600\tSID\tabc123\n\
        .youtube.com\tTRUE\t/\tFALSE\t0\tPREF\tf6=40000000&hl=en\r\n\
        garbage line without tabs\n";

    #[test]
    fn test_parse_single_line() {
        let cookies = parse_netscape("example.com\tTRUE\t/\tFALSE\t0\tSID\tabc123");
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "SID");
        assert_eq!(cookies[0].value, "abc123");
        assert!(!cookies[0].secure);
        assert_eq!(cookie_header(&cookies), "SID=abc123");
    }

    #[test]
    fn test_parse_skips_comments_blank_and_malformed() {
        let cookies = parse_netscape(SAMPLE);
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].domain, ".youtube.com");
        assert!(cookies[0].secure);
        assert_eq!(cookies[0].expires_utc, Some(1767225600));
        assert_eq!(cookie_header(&cookies), "SID=abc123; PREF=f6=40000000&hl=en");
    }

    #[test]
    fn test_short_line_is_skipped() {
        let cookies = parse_netscape("a\tb\tc\td\te\tname\nexample.com\tTRUE\t/\tFALSE\t0\tok\t1");
        assert_eq!(cookie_header(&cookies), "ok=1");
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        assert!(load(&path, CookieMode::File).unwrap().is_none());
        assert!(load(&path, CookieMode::Header).unwrap().is_none());
    }

    #[test]
    fn test_load_modes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let auth = load(file.path(), CookieMode::File).unwrap();
        assert_eq!(auth, Some(CookieAuth::File(file.path().to_path_buf())));

        let auth = load(file.path(), CookieMode::Header).unwrap();
        assert_eq!(
            auth,
            Some(CookieAuth::Header("SID=abc123; PREF=f6=40000000&hl=en".to_string()))
        );
    }

    #[test]
    fn test_file_without_cookies_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"# only comments\n\nnot\ta\tcookie\n").unwrap();
        for mode in [CookieMode::File, CookieMode::Header] {
            let err = load(file.path(), mode).unwrap_err();
            assert!(matches!(err, CookieError::NoCookies { .. }));
        }
    }

    #[test]
    fn test_non_utf8_is_unreadable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x9f]).unwrap();
        for mode in [CookieMode::File, CookieMode::Header] {
            let err = load(file.path(), mode).unwrap_err();
            assert!(matches!(err, CookieError::Unreadable { .. }));
        }
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for mode in [CookieMode::File, CookieMode::Header] {
            let err = load(dir.path(), mode).unwrap_err();
            assert!(matches!(err, CookieError::NotAFile { .. }));
            assert!(err.to_string().contains("not a regular file"));
        }
    }

    #[test]
    fn test_mode_from_toml_name() {
        #[derive(Deserialize)]
        struct Wrap {
            mode: CookieMode,
        }
        let w: Wrap = toml::from_str("mode = \"header\"").unwrap();
        assert_eq!(w.mode, CookieMode::Header);
    }
}
