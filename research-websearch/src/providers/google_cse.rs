//! [`GoogleCustomSearch`]: the Google Programmable Search Engine API
//! (spec.md §4.1).

use research_core::{Hit, ProviderStatus, Query, SearchProvider};
use serde::Deserialize;

use crate::retry::with_retry;

const GOOGLE_API_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Default for `max_retries` absent an explicit [`Self::with_max_retries`]
/// call, matching spec.md §5's `per_provider_retries` default.
const DEFAULT_MAX_RETRIES: u8 = 2;

/// Google Custom Search JSON API provider.
///
/// Requires an API key and a Programmable Search Engine id (`cx`).
/// `is_configured()` is `false` whenever either is empty, so the
/// dispatcher excludes it from the chain without ever making a call.
#[derive(Debug, Clone)]
pub struct GoogleCustomSearch {
    api_key: String,
    cx: String,
    client: reqwest::Client,
    max_retries: u8,
}

impl GoogleCustomSearch {
    /// Builds a provider from an API key and search-engine id. Either
    /// may be empty, in which case [`SearchProvider::is_configured`]
    /// reports `false`.
    #[must_use]
    pub fn new(api_key: impl Into<String>, cx: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            cx: cx.into(),
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

impl SearchProvider for GoogleCustomSearch {
    fn name(&self) -> &str {
        "google_custom_search"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.cx.is_empty()
    }

    async fn search(&self, query: &Query, limit: usize) -> (Vec<Hit>, ProviderStatus) {
        with_retry(self.max_retries, || self.call_once(query, limit)).await
    }
}

impl GoogleCustomSearch {
    async fn call_once(&self, query: &Query, limit: usize) -> (Vec<Hit>, ProviderStatus) {
        let num = limit.clamp(1, 10);
        let request = self
            .client
            .get(GOOGLE_API_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", query.text()),
                ("num", &num.to_string()),
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
        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return (Vec::new(), ProviderStatus::AuthMissing);
        }
        if response.status().is_server_error() {
            return (Vec::new(), ProviderStatus::Upstream5xx);
        }

        let Ok(parsed) = response.json::<GoogleResponse>().await else {
            return (Vec::new(), ProviderStatus::Malformed);
        };

        let hits: Vec<Hit> = parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(|item| Hit {
                title: item.title,
                url: item.link,
                snippet: item.snippet.unwrap_or_default(),
                provider_name: "google_custom_search".into(),
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

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    items: Option<Vec<GoogleItem>>,
}

#[derive(Debug, Deserialize)]
struct GoogleItem {
    title: String,
    link: String,
    snippet: Option<String>,
}
