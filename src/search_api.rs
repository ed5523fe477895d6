use reqwest::{Client, Response, Url};
use tracing::debug;

use crate::data_models::{Query, SearchResult};
use crate::error::{ClientError, Result};

pub const SEARCH_PATH: &str = "/api/search-results";

/// Client for the backend search API.
#[derive(Debug, Clone)]
pub struct SearchApi {
    client: Client,
    base_url: String,
}

impl SearchApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// `<base>/api/search-results?advanced=..&query=..`, form-urlencoded.
    pub fn request_url(&self, query: &Query) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, SEARCH_PATH);
        let mut url = Url::parse(&raw)
            .map_err(|e| ClientError::Config(format!("invalid search url {raw}: {e}")))?;
        url.query_pairs_mut().clear().extend_pairs(query.params());
        Ok(url)
    }

    /// Sends the query. Any HTTP status counts as a response; only transport
    /// failures are errors here.
    pub async fn send(&self, query: &Query) -> Result<Response> {
        let url = self.request_url(query)?;
        debug!(%url, "requesting search results");
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Http(format!("search request failed: {e}")))
    }

    pub async fn decode(response: Response) -> Result<Vec<SearchResult>> {
        let status = response.status();
        response
            .json::<Vec<SearchResult>>()
            .await
            .map_err(|e| ClientError::Decode(format!("search response ({status}): {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> SearchApi {
        SearchApi::new(Client::new(), base)
    }

    #[test]
    fn url_has_path_and_both_params() {
        let url = api("http://localhost:5000")
            .request_url(&Query::new("cats", false))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/search-results?advanced=false&query=cats"
        );
    }

    #[test]
    fn url_encodes_query_text() {
        let url = api("http://localhost:5000")
            .request_url(&Query::new("tom & jerry?=1 ü", true))
            .unwrap();
        assert_eq!(
            url.query(),
            Some("advanced=true&query=tom+%26+jerry%3F%3D1+%C3%BC")
        );

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("advanced".to_string(), "true".to_string()),
                ("query".to_string(), "tom & jerry?=1 ü".to_string()),
            ]
        );
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        let url = api("http://search.local:8000/")
            .request_url(&Query::new("x", false))
            .unwrap();
        assert_eq!(url.path(), "/api/search-results");
    }

    #[test]
    fn base_url_with_prefix_keeps_it() {
        let url = api("https://example.org/meklet")
            .request_url(&Query::new("x", false))
            .unwrap();
        assert_eq!(url.path(), "/meklet/api/search-results");
    }

    #[test]
    fn bad_base_url_is_a_config_error() {
        let err = api("not a url")
            .request_url(&Query::new("x", false))
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
