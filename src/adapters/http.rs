use crate::domain::ports::{ImageSearch, SearchResponse};
use crate::utils::error::{EnrichError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://www.bing.com/images/search";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Engine constants sent alongside `q`.
pub fn default_params() -> Vec<(String, String)> {
    [("form", "HDRSC2"), ("first", "1"), ("tsc", "ImageHoverTitle")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Bing Images over HTML scraping.
pub struct BingImageSearch {
    client: Client,
    endpoint: String,
    params: Vec<(String, String)>,
}

impl BingImageSearch {
    pub fn new(
        endpoint: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
        params: Vec<(String, String)>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let agent =
            HeaderValue::from_str(user_agent).map_err(|e| EnrichError::InvalidConfigValueError {
                field: "search.user_agent".to_string(),
                value: user_agent.to_string(),
                reason: e.to_string(),
            })?;
        headers.insert(USER_AGENT, agent);

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            params,
        })
    }
}

#[async_trait]
impl ImageSearch for BingImageSearch {
    async fn fetch(&self, query: &str) -> Result<SearchResponse> {
        tracing::debug!("GET {} q='{}'", self.endpoint, query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .query(&self.params)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!("Search response status {} ({} bytes)", status, body.len());

        Ok(SearchResponse { status, body })
    }
}
