use std::io;
use std::time::Duration;
use thiserror::Error;

/// Anything that went wrong between spawning the extractor and parsing its JSON.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("yt-dlp failed: {message}")]
    Failed { message: String },

    #[error("yt-dlp returned malformed output: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("yt-dlp i/o: {0}")]
    Io(#[from] io::Error),
}

/// Condenses yt-dlp stderr to the line worth showing a user.
pub(crate) fn stderr_message(stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        return "no error output".to_string();
    }
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:"))
        .unwrap_or(stderr)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_message_prefers_error_line() {
        let stderr = b"[youtube] Extracting URL\nWARNING: slow\nERROR: [youtube] x: Video unavailable\n";
        assert_eq!(stderr_message(stderr), "ERROR: [youtube] x: Video unavailable");
    }

    #[test]
    fn test_stderr_message_fallbacks() {
        assert_eq!(stderr_message(b"  boom \n"), "boom");
        assert_eq!(stderr_message(b"\n"), "no error output");
    }

    #[test]
    fn test_messages_are_readable() {
        let err = ExtractionError::Timeout(Duration::from_secs(60));
        assert_eq!(err.to_string(), "extraction timed out after 60s");

        let err = ExtractionError::Failed {
            message: "ERROR: private video".to_string(),
        };
        assert_eq!(err.to_string(), "yt-dlp failed: ERROR: private video");
    }
}
