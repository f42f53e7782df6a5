use anyhow::{Context, Result};

/// Default analysis endpoint when `ANALYZER_API_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Default request timeout in seconds. AI analysis can take a while,
/// so this is generous.
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 120;

/// Application configuration loaded from environment variables.
/// Every variable has a sensible local default.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub upload_timeout_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_base_url: std::env::var("ANALYZER_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            upload_timeout_secs: std::env::var("ANALYZER_UPLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .context("ANALYZER_UPLOAD_TIMEOUT_SECS must be a number of seconds")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
