//! Article summaries from the encyclopedia query API.

use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::trace;

use crate::error::{ClientError, Result};

pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone)]
pub struct SummaryClient {
    client: Client,
    endpoint: String,
    max_chars: usize,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    pages: BTreeMap<String, ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: Option<String>,
}

impl SummaryClient {
    pub fn new(client: Client, endpoint: impl Into<String>, max_chars: usize) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            max_chars,
        }
    }

    /// Plain-text intro extract for `title`, following redirects. `origin=*`
    /// keeps the request valid for browsers sharing this URL.
    pub fn summary_url(&self, title: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            ClientError::Config(format!("invalid summary endpoint {}: {e}", self.endpoint))
        })?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("action", "query")
            .append_pair("prop", "extracts")
            .append_pair("exintro", "")
            .append_pair("explaintext", "")
            .append_pair("redirects", "1")
            .append_pair("titles", title)
            .append_pair("origin", "*");
        Ok(url)
    }

    pub async fn fetch_extract(&self, title: &str) -> Result<String> {
        let url = self.summary_url(title)?;
        trace!(title, "requesting summary");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Http(format!("summary request for {title:?} failed: {e}")))?;
        let body: ExtractResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("summary for {title:?}: {e}")))?;

        body.query
            .pages
            .into_values()
            .next()
            .and_then(|page| page.extract)
            .ok_or_else(|| ClientError::Decode(format!("no extract for {title:?}")))
    }

    /// The extract cut down to the display length.
    pub async fn fetch_summary(&self, title: &str) -> Result<String> {
        let extract = self.fetch_extract(title).await?;
        Ok(truncate_summary(&extract, self.max_chars))
    }
}

/// The first `max_chars` characters followed by an ellipsis. Short extracts
/// get the ellipsis too.
pub fn truncate_summary(extract: &str, max_chars: usize) -> String {
    let mut summary: String = extract.chars().take(max_chars).collect();
    summary.push_str(ELLIPSIS);
    summary
}
