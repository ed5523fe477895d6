//! Shared HTTP client for the search and summary services.

use std::time::Duration;

use crate::config::Config;
use crate::error::{ClientError, Result};

const USER_AGENT: &str = concat!("meklet/", env!("CARGO_PKG_VERSION"));

/// Build the [`reqwest::Client`] both services are queried with.
///
/// The encyclopedia API rejects anonymous clients, so a User-Agent is always
/// sent.
pub fn build_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(Duration::from_secs(5).min(config.request_timeout))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ClientError::Http(format!("failed to build HTTP client: {e}")))
}
