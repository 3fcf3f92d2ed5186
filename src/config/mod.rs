use crate::resolve::CookieMode;
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod defaults;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub extractor: ExtractorConfig,
    pub cookies: CookiesConfig,
    pub cache: CacheConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// yt-dlp binary (name on PATH or absolute path).
    pub program: PathBuf,
    /// Seconds before a hung yt-dlp is killed.
    pub timeout_secs: u64,
    /// Appended after the built-in flags, before the target.
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookiesConfig {
    /// Netscape cookie file exported from a browser. Missing file = no auth.
    pub path: Option<PathBuf>,
    /// "file" passes the file to yt-dlp as is, "header" sends a Cookie header.
    pub mode: CookieMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

impl ExtractorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(defaults::PROGRAM),
            timeout_secs: defaults::TIMEOUT_SECS,
            extra_args: Vec::new(),
        }
    }
}

impl Default for CookiesConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from(defaults::COOKIE_PATH)),
            mode: CookieMode::File,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: defaults::CACHE_TTL_SECS,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = project_dirs();
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("muse-resolve"));
        Self { data_dir }
    }
}

impl PathsConfig {
    pub fn cache_db(&self) -> PathBuf {
        self.data_dir.join("cache.sqlite3")
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "muse", "muse-resolve")
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = project_dirs().context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

fn write_config(path: &Path, cfg: &Config) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

/// Loads the config, writing the defaults out on first run.
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = defaults::defaults();
        write_config(&path, &cfg).context("write default config")?;
        tracing::debug!(path = %path.display(), "wrote default config");
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
