use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Timeouts, TLS and proxy behaviour shared by the page and image clients.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub page_timeout: Duration,
    pub image_timeout: Duration,
    pub insecure_ssl: bool,
    /// Route all outbound requests through this proxy URL.
    pub proxy: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            page_timeout: Duration::from_secs(10),
            image_timeout: Duration::from_secs(30),
            insecure_ssl: false,
            proxy: None,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub http: HttpSettings,
    /// Directory that request-supplied `save_dir` values are resolved under.
    pub image_root: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = HttpSettings::default();
        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{key} must be a whole number of seconds")),
                None => Ok(default),
            }
        };

        Ok(Self {
            bind_addr: lookup("XHS_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            http: HttpSettings {
                connect_timeout: secs("XHS_CONNECT_TIMEOUT_SECS", defaults.connect_timeout)?,
                page_timeout: secs("XHS_FETCH_TIMEOUT_SECS", defaults.page_timeout)?,
                image_timeout: secs("XHS_IMAGE_TIMEOUT_SECS", defaults.image_timeout)?,
                insecure_ssl: lookup("XHS_INSECURE_SSL").as_deref() == Some("1"),
                proxy: lookup("XHS_HTTP_PROXY").filter(|p| !p.trim().is_empty()),
            },
            image_root: lookup("XHS_IMAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("images")),
        })
    }
}
