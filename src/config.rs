use std::path::PathBuf;
use std::time::Duration;
use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_STATE_FILE: &str = "coursedesk-session.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub state_file: PathBuf,
    pub log_level: LevelFilter,
    pub timeout: Duration,
}

impl Config {
    // Reads COURSEDESK_* variables. Call `dotenv().ok()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("COURSEDESK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = parse_api_url(&raw_url)?;

        let state_file = lookup("COURSEDESK_STATE_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));

        let log_level = match lookup("COURSEDESK_LOG_LEVEL") {
            Some(level) => parse_level(&level)?,
            None => LevelFilter::Info,
        };

        let timeout_secs = match lookup("COURSEDESK_TIMEOUT_SECS") {
            Some(secs) => secs
                .trim()
                .parse::<u64>()
                .with_context(|| format!("COURSEDESK_TIMEOUT_SECS must be a whole number of seconds, got {:?}", secs))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Config {
            api_url,
            state_file,
            log_level,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

pub fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid API url {:?}", raw))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("API url must be an http(s) url, got {:?}", raw));
    }
    Ok(url)
}

fn parse_level(raw: &str) -> Result<LevelFilter> {
    raw.trim()
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("Unknown log level {:?}, expected error, warn, info, debug or trace", raw))
}
