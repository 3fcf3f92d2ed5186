//! Query-to-stream resolution.
//!
//! A raw query is classified into an extraction target, handed to yt-dlp,
//! and the resulting JSON is walked for a single audio-only stream URL.

pub mod classify;
pub mod cookies;
pub mod error;
pub mod extractor;
pub mod models;
pub mod select;

pub use classify::{ExtractionTarget, classify};
pub use cookies::CookieMode;
pub use error::ExtractionError;
pub use extractor::{Extractor, YtDlp};
pub use models::ResolvedStream;

use cookies::CookieAuth;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Resolver<E> {
    extractor: E,
    cookies: Option<PathBuf>,
    cookie_mode: CookieMode,
}

impl<E: Extractor> Resolver<E> {
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            cookies: None,
            cookie_mode: CookieMode::default(),
        }
    }

    pub fn with_cookies(mut self, path: Option<PathBuf>, mode: CookieMode) -> Self {
        self.cookies = path;
        self.cookie_mode = mode;
        self
    }

    /// Reads the cookie file fresh for every resolution. An unreadable file
    /// downgrades to an unauthenticated run.
    fn auth(&self) -> Option<CookieAuth> {
        let path = self.cookies.as_deref()?;
        match cookies::load(path, self.cookie_mode) {
            Ok(None) => {
                tracing::debug!(path = %path.display(), "no cookie file, running unauthenticated");
                None
            }
            Ok(auth) => auth,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring cookie file");
                None
            }
        }
    }

    pub async fn resolve(&self, query: &str) -> Result<ResolvedStream, ExtractionError> {
        self.resolve_target(&classify(query)).await
    }

    pub async fn resolve_target(
        &self,
        target: &ExtractionTarget,
    ) -> Result<ResolvedStream, ExtractionError> {
        let auth = self.auth();
        tracing::debug!(
            %target,
            search = target.is_search(),
            authenticated = auth.is_some(),
            "resolving"
        );

        let info = self.extractor.extract(target, auth.as_ref()).await?;
        let stream = ResolvedStream {
            title: info.title(),
            audio_url: select::select_audio_url(&info),
        };

        tracing::info!(
            title = %stream.title,
            url = stream.audio_url.as_deref().unwrap_or("<none>"),
            "resolved"
        );
        Ok(stream)
    }
}

/// The single terminal message a caller shows for one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Playable { title: String, url: String },
    NoPlayableUrl { title: String },
    Failed { message: String },
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Playable { .. } => 0,
            Outcome::Failed { .. } => 1,
            Outcome::NoPlayableUrl { .. } => 2,
        }
    }
}

impl From<ResolvedStream> for Outcome {
    fn from(stream: ResolvedStream) -> Self {
        match stream.audio_url {
            Some(url) => Outcome::Playable {
                title: stream.title,
                url,
            },
            None => Outcome::NoPlayableUrl {
                title: stream.title,
            },
        }
    }
}

impl From<Result<ResolvedStream, ExtractionError>> for Outcome {
    fn from(res: Result<ResolvedStream, ExtractionError>) -> Self {
        match res {
            Ok(stream) => stream.into(),
            Err(e) => {
                tracing::error!(error = %e, "extraction failed");
                Outcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Playable { title, url } => write!(f, "Title: {title}\nURL: {url}"),
            Outcome::NoPlayableUrl { .. } => f.write_str("No playable URL found."),
            Outcome::Failed { message } => write!(f, "Error: {message}"),
        }
    }
}
