use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use tracing::warn;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const SETTINGS_FILE: &str = "detect.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub request_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn predict_url(&self) -> anyhow::Result<Url> {
        let base = normalize_api_url(&self.api_url)?;
        Url::parse(&format!("{base}/predict"))
            .with_context(|| format!("invalid predict endpoint for api url '{base}'"))
    }
}

/// Defaults, then `detect.toml` in the working directory, then the
/// environment.
pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match raw.parse::<toml::Table>() {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("api_url").and_then(|v| v.as_str()) {
                    settings.api_url = v.to_string();
                }
                if let Some(v) = file_cfg
                    .get("request_timeout_ms")
                    .and_then(|v| v.as_integer())
                    .and_then(|v| u64::try_from(v).ok())
                {
                    settings.request_timeout_ms = accept_timeout_ms(v, "request_timeout_ms");
                }
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable settings file");
            }
        }
    }

    if let Some(v) = env("DETECT_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => {
                settings.request_timeout_ms = accept_timeout_ms(parsed, "APP__REQUEST_TIMEOUT_MS")
            }
            Err(_) => warn!(value = %v, "ignoring non-numeric APP__REQUEST_TIMEOUT_MS"),
        }
    }

    settings
}

/// A zero timeout would fail every request immediately.
fn accept_timeout_ms(value: u64, source: &str) -> u64 {
    if value == 0 {
        warn!(source, "ignoring zero request timeout; using the default");
        return DEFAULT_REQUEST_TIMEOUT_MS;
    }
    value
}

/// Trims whitespace and trailing slashes; an empty value falls back to the
/// local development default. Only http and https are accepted.
pub fn normalize_api_url(raw_api_url: &str) -> anyhow::Result<String> {
    let trimmed = raw_api_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(DEFAULT_API_URL.to_string());
    }

    let parsed = Url::parse(trimmed).with_context(|| format!("invalid api url '{trimmed}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("api url '{trimmed}' must use http or https");
    }

    Ok(trimmed.to_string())
}
