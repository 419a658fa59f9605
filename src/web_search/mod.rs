//! Web search client for the Verifier: a thin SerpAPI-compatible HTTP
//! client that is simply absent (returns empty) when no key is configured.

use crate::error::Error;
use serde::Deserialize;

/// One search result: a URL and its snippet text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// The result's URL, when the provider returned one.
    pub url: Option<String>,
    /// The result's snippet text, when the provider returned one.
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SerpApiResult>,
}

#[derive(Debug, Deserialize)]
struct SerpApiResult {
    link: Option<String>,
    #[serde(default)]
    snippet: String,
}

/// A SerpAPI-compatible web search client.
pub struct WebSearch {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl WebSearch {
    /// Builds a client. `api_key: None` means the search surface is
    /// disabled — [`WebSearch::search`] always returns `Ok(vec![])`.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self { client: reqwest::Client::new(), api_key }
    }

    /// True when a key is configured and searches will actually run.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Searches for `query`, returning up to `k` results. Returns `Ok(vec![])`
    /// immediately when disabled.
    pub async fn search(&self, query: &str, k: usize) -> crate::Result<Vec<SearchResult>> {
        let Some(api_key) = &self.api_key else {
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get("https://serpapi.com/search.json")
            .query(&[("q", query), ("api_key", api_key.as_str()), ("engine", "google")])
            .send()
            .await
            .map_err(|e| Error::ProviderError {
                provider: "serpapi".to_string(),
                task: "webSearch".to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::ProviderError {
                provider: "serpapi".to_string(),
                task: "webSearch".to_string(),
                message: format!("status {}", response.status()),
            });
        }

        let parsed: SerpApiResponse = response.json().await.map_err(|e| Error::BadOutput {
            task: "webSearch".to_string(),
            message: e.to_string(),
        })?;

        Ok(parsed
            .organic_results
            .into_iter()
            .take(k)
            .map(|r| SearchResult { url: r.link, snippet: r.snippet })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_without_api_key_returns_empty() {
        let search = WebSearch::new(None);
        assert!(!search.is_enabled());
        let results = search.search("anything", 3).await.unwrap();
        assert!(results.is_empty());
    }
}
