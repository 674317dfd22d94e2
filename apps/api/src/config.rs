use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable is optional; missing ones fall back to defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Without a key every request uses a fallback image.
    pub giphy_api_key: Option<String>,
    /// Overrides the bundled lexicon.
    pub lexicon_path: Option<PathBuf>,
    /// Extra fonts loaded on top of the system font database.
    pub font_dir: Option<PathBuf>,
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            giphy_api_key: optional_env("GIPHY_API_KEY"),
            lexicon_path: optional_env("LEXICON_PATH").map(PathBuf::from),
            font_dir: optional_env("FONT_DIR").map(PathBuf::from),
            fetch_timeout: Duration::from_secs(
                std::env::var("FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse::<u64>()
                    .context("FETCH_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
        })
    }
}

/// Set and non-blank, or `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
