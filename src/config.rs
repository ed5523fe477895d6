use dotenvy::dotenv;
use reqwest::Url;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ClientError, Result};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_SUMMARY_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_SUMMARY_CHARS: usize = 400;

/// Runtime settings for the front-end. Built once at startup and handed to
/// whatever needs it; nothing reads the environment after that.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the search API, without the `/api/search-results` path.
    pub server_url: String,
    /// Encyclopedia query endpoint used for result summaries.
    pub summary_endpoint: String,
    pub summary_max_chars: usize,
    /// Upper bound on summary requests in flight for one page.
    pub summary_concurrency: usize,
    /// How long the server waits for summaries before rendering.
    pub summary_wait: Duration,
    pub request_timeout: Duration,
    pub bind_addr: String,
    pub static_dir: PathBuf,
    /// Page template; the built-in one is used when unset.
    pub template_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            summary_endpoint: DEFAULT_SUMMARY_ENDPOINT.to_string(),
            summary_max_chars: DEFAULT_SUMMARY_CHARS,
            summary_concurrency: 8,
            summary_wait: Duration::from_millis(3000),
            request_timeout: Duration::from_secs(10),
            bind_addr: "127.0.0.1:8080".to_string(),
            static_dir: PathBuf::from("static"),
            template_path: None,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads `MEKLET_*` variables over the defaults.
    pub fn from_env() -> Result<Config> {
        dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let config = Config {
            server_url: get_or_default(&lookup, "MEKLET_SERVER_URL", defaults.server_url),
            summary_endpoint: get_or_default(
                &lookup,
                "MEKLET_SUMMARY_ENDPOINT",
                defaults.summary_endpoint,
            ),
            summary_max_chars: get_parsed(
                &lookup,
                "MEKLET_SUMMARY_CHARS",
                defaults.summary_max_chars,
            )?,
            summary_concurrency: get_parsed(
                &lookup,
                "MEKLET_SUMMARY_CONCURRENCY",
                defaults.summary_concurrency,
            )?,
            summary_wait: get_parsed(&lookup, "MEKLET_SUMMARY_WAIT_MS", None::<u64>)
                .map(|ms| ms.map(Duration::from_millis).unwrap_or(defaults.summary_wait))?,
            request_timeout: get_parsed(&lookup, "MEKLET_REQUEST_TIMEOUT_SECS", None::<u64>)
                .map(|s| s.map(Duration::from_secs).unwrap_or(defaults.request_timeout))?,
            bind_addr: get_or_default(&lookup, "MEKLET_BIND_ADDR", defaults.bind_addr),
            static_dir: lookup("MEKLET_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            template_path: lookup("MEKLET_TEMPLATE").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.summary_concurrency == 0 {
            return Err(ClientError::Config(
                "summary_concurrency must be greater than 0".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ClientError::Config(
                "request_timeout must be greater than 0".into(),
            ));
        }
        Url::parse(&self.server_url)
            .map_err(|e| ClientError::Config(format!("invalid server_url {}: {e}", self.server_url)))?;
        Url::parse(&self.summary_endpoint).map_err(|e| {
            ClientError::Config(format!(
                "invalid summary_endpoint {}: {e}",
                self.summary_endpoint
            ))
        })?;
        Ok(())
    }
}

fn get_or_default<F>(lookup: &F, key: &str, default: String) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or(default)
}

fn get_parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: ParseValue,
{
    match lookup(key) {
        Some(raw) => T::parse_value(raw.trim())
            .map_err(|e| ClientError::Config(format!("{key}={raw}: {e}"))),
        None => Ok(default),
    }
}

trait ParseValue: Sized {
    fn parse_value(raw: &str) -> std::result::Result<Self, String>;
}

impl ParseValue for usize {
    fn parse_value(raw: &str) -> std::result::Result<Self, String> {
        usize::from_str(raw).map_err(|e| e.to_string())
    }
}

impl ParseValue for Option<u64> {
    fn parse_value(raw: &str) -> std::result::Result<Self, String> {
        u64::from_str(raw).map(Some).map_err(|e| e.to_string())
    }
}
