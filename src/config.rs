use crate::progress::RepeatAward;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://kevs-university.onrender.com";
pub const DEFAULT_CACHE_PATH: &str = "data/local_cache.json";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_url: String,
    pub cache_path: PathBuf,
    pub repeat_award: RepeatAward,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let api_url = lookup("PORTAL_API_URL")
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let cache_path = lookup("PORTAL_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH));
        let repeat_award = RepeatAward::from_setting(lookup("PORTAL_REPEAT_AWARD").as_deref());

        Self {
            port,
            api_url,
            cache_path,
            repeat_award,
        }
    }
}
