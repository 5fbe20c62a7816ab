//! [`SearchApi`]: a generic SERP-style search API provider
//! (spec.md §4.1).

use research_core::{Hit, ProviderStatus, Query, SearchProvider};
use serde::Deserialize;

use crate::retry::with_retry;

const SEARCHAPI_URL: &str = "https://www.searchapi.io/api/v1/search";

/// Default for `max_retries` absent an explicit [`SearchApi::with_max_retries`]
/// call, matching spec.md §5's `per_provider_retries` default.
const DEFAULT_MAX_RETRIES: u8 = 2;

/// A generic SERP-style search API (modeled on services such as
/// SearchApi.io / SerpApi: one API key, `google` engine by default,
/// a JSON `organic_results` array).
#[derive(Debug, Clone)]
pub struct SearchApi {
    api_key: String,
    client: reqwest::Client,
    max_retries: u8,
}

impl SearchApi {
    /// Builds a provider from an API key. An empty key makes
    /// [`SearchProvider::is_configured`] report `false`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Overrides how many times a transient failure is retried
    /// (`config.per_provider_retries`).
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl SearchProvider for SearchApi {
    fn name(&self) -> &str {
        "search_api"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn search(&self, query: &Query, limit: usize) -> (Vec<Hit>, ProviderStatus) {
        with_retry(self.max_retries, || self.call_once(query, limit)).await
    }
}

impl SearchApi {
    async fn call_once(&self, query: &Query, limit: usize) -> (Vec<Hit>, ProviderStatus) {
        let request = self
            .client
            .get(SEARCHAPI_URL)
            .query(&[
                ("engine", "google"),
                ("api_key", self.api_key.as_str()),
                ("q", query.text()),
                ("num", &limit.to_string()),
            ])
            .send()
            .await;

        let response = match request {
            Ok(response) => response,
            Err(err) if err.is_timeout() => return (Vec::new(), ProviderStatus::Timeout),
            Err(_) => return (Vec::new(), ProviderStatus::Upstream5xx),
        };

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return (Vec::new(), ProviderStatus::RateLimited);
        }
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return (Vec::new(), ProviderStatus::AuthMissing);
        }
        if response.status().is_server_error() {
            return (Vec::new(), ProviderStatus::Upstream5xx);
        }

        let Ok(parsed) = response.json::<SearchApiResponse>().await else {
            return (Vec::new(), ProviderStatus::Malformed);
        };

        let hits: Vec<Hit> = parsed
            .organic_results
            .into_iter()
            .take(limit)
            .map(|result| Hit {
                title: result.title,
                url: result.link,
                snippet: result.snippet.unwrap_or_default(),
                provider_name: "search_api".into(),
                published_at: None,
            })
            .collect();

        if hits.is_empty() {
            (hits, ProviderStatus::Empty)
        } else {
            (hits, ProviderStatus::Ok)
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct SearchApiResponse {
    #[serde(default)]
    organic_results: Vec<SearchApiResult>,
}

#[derive(Debug, Deserialize)]
struct SearchApiResult {
    title: String,
    link: String,
    snippet: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_an_api_key() {
        assert!(!SearchApi::new("").is_configured());
        assert!(SearchApi::new("key").is_configured());
    }
}
