use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use tracing::warn;
use url::Url;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub gemini_api_key: String,
    pub gemini_base_url: Url,
    pub gemini_image_model: String,
    pub gemini_request_timeout_secs: u64,
    pub caption_interval_ms: u64,
    pub state_path: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub gemini_log_payloads: bool,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_base_url(value: &str) -> Result<Url> {
    let trimmed = value.trim().trim_end_matches('/');
    let parsed =
        Url::parse(trimmed).map_err(|err| anyhow!("Invalid GEMINI_BASE_URL '{}': {}", value, err))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(anyhow!(
            "GEMINI_BASE_URL must use http or https, got '{}'",
            other
        )),
    }
}

fn normalize_caption_interval(value: u64) -> u64 {
    if value == 0 {
        warn!("CAPTION_INTERVAL_MS must be positive; using 2500.");
        return 2500;
    }
    value
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            gemini_api_key: env_string("GEMINI_API_KEY", "").trim().to_string(),
            gemini_base_url: parse_base_url(&env_string(
                "GEMINI_BASE_URL",
                DEFAULT_GEMINI_BASE_URL,
            ))?,
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "gemini-2.5-flash-image"),
            gemini_request_timeout_secs: env_u64("GEMINI_REQUEST_TIMEOUT_SECS", 90),
            caption_interval_ms: normalize_caption_interval(env_u64("CAPTION_INTERVAL_MS", 2500)),
            state_path: PathBuf::from(env_string("STUDIO_STATE_PATH", "studio_state.json")),
            output_dir: PathBuf::from(env_string("STUDIO_OUTPUT_DIR", ".")),
            log_dir: PathBuf::from(env_string("STUDIO_LOG_DIR", "logs")),
            gemini_log_payloads: env_bool("GEMINI_LOG_PAYLOADS", false),
        })
    }

    pub fn caption_interval(&self) -> Duration {
        Duration::from_millis(self.caption_interval_ms)
    }

    pub fn gemini_request_timeout(&self) -> Duration {
        Duration::from_secs(self.gemini_request_timeout_secs)
    }
}
