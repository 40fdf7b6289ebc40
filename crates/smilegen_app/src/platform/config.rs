//! Engine settings with environment overrides.

use std::time::Duration;

use anyhow::{Context, Result};
use smilegen_engine::EngineSettings;

pub const BASE_URL_ENV: &str = "SMILEGEN_BASE_URL";
pub const TIMEOUT_ENV: &str = "SMILEGEN_TIMEOUT_SECS";
pub const MAX_RETRIES_ENV: &str = "SMILEGEN_MAX_RETRIES";

/// Defaults overlaid with `SMILEGEN_*` variables from the process environment or `.env`.
pub fn load_settings() -> Result<EngineSettings> {
    let _ = dotenvy::dotenv();
    settings_from(|name| std::env::var(name).ok())
}

pub fn settings_from(lookup: impl Fn(&str) -> Option<String>) -> Result<EngineSettings> {
    let mut settings = EngineSettings::default();
    if let Some(base_url) = lookup(BASE_URL_ENV).filter(|value| !value.trim().is_empty()) {
        settings.client.base_url = base_url.trim().to_string();
    }
    if let Some(raw) = lookup(TIMEOUT_ENV) {
        let secs: u64 = raw
            .trim()
            .parse()
            .with_context(|| format!("{TIMEOUT_ENV} must be a whole number of seconds"))?;
        settings.client.request_timeout = Duration::from_secs(secs);
    }
    if let Some(raw) = lookup(MAX_RETRIES_ENV) {
        settings.client.retry.max_retries = raw
            .trim()
            .parse()
            .with_context(|| format!("{MAX_RETRIES_ENV} must be a whole number"))?;
    }
    Ok(settings)
}
