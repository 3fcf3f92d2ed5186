use super::Config;

pub const PROGRAM: &str = "yt-dlp";
pub const TIMEOUT_SECS: u64 = 60;
pub const COOKIE_PATH: &str = "/usr/app/youtube.com_cookies.txt";
pub const CACHE_TTL_SECS: u64 = 60 * 60;

pub fn defaults() -> Config {
    Config::default()
}
