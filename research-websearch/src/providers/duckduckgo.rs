//! [`DuckDuckGo`]: the free, keyless Instant Answer API
//! (spec.md §4.1).
//!
//! DuckDuckGo's Instant Answer API is not a full web index — it
//! mostly returns `RelatedTopics` abstracts. It's kept last in the
//! default chain (before [`crate::KnowledgeFallback`]) precisely
//! because its coverage is shallow but it requires no credentials.

use research_core::{Hit, ProviderStatus, Query, SearchProvider};
use serde::Deserialize;

use crate::retry::with_retry;

const DUCKDUCKGO_API_URL: &str = "https://api.duckduckgo.com/";

/// Default for `max_retries` absent an explicit [`DuckDuckGo::with_max_retries`]
/// call, matching spec.md §5's `per_provider_retries` default.
const DEFAULT_MAX_RETRIES: u8 = 2;

/// DuckDuckGo Instant Answer API provider. Always configured — no
/// credentials are required.
#[derive(Debug, Clone)]
pub struct DuckDuckGo {
    client: reqwest::Client,
    max_retries: u8,
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self {
            client: reqwest::Client::default(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl DuckDuckGo {
    /// Builds a new provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides how many times a transient failure is retried
    /// (`config.per_provider_retries`).
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl SearchProvider for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn search(&self, query: &Query, limit: usize) -> (Vec<Hit>, ProviderStatus) {
        with_retry(self.max_retries, || self.call_once(query, limit)).await
    }
}

impl DuckDuckGo {
    async fn call_once(&self, query: &Query, limit: usize) -> (Vec<Hit>, ProviderStatus) {
        let request = self
            .client
            .get(DUCKDUCKGO_API_URL)
            .query(&[
                ("q", query.text()),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await;

        let response = match request {
            Ok(response) => response,
            Err(err) if err.is_timeout() => return (Vec::new(), ProviderStatus::Timeout),
            Err(_) => return (Vec::new(), ProviderStatus::Upstream5xx),
        };

        if response.status().is_server_error() {
            return (Vec::new(), ProviderStatus::Upstream5xx);
        }

        let Ok(parsed) = response.json::<DuckDuckGoResponse>().await else {
            return (Vec::new(), ProviderStatus::Malformed);
        };

        let mut hits = Vec::new();
        if !parsed.abstract_text.is_empty() && !parsed.abstract_url.is_empty() {
            hits.push(Hit {
                title: parsed.heading.clone(),
                url: parsed.abstract_url.clone(),
                snippet: parsed.abstract_text.clone(),
                provider_name: "duckduckgo".into(),
                published_at: None,
            });
        }
        for topic in parsed.related_topics {
            if let (Some(text), Some(first_url)) = (topic.text, topic.first_url) {
                hits.push(Hit {
                    title: text.clone(),
                    url: first_url,
                    snippet: text,
                    provider_name: "duckduckgo".into(),
                    published_at: None,
                });
            }
        }
        hits.truncate(limit);

        if hits.is_empty() {
            (hits, ProviderStatus::Empty)
        } else {
            (hits, ProviderStatus::Ok)
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct DuckDuckGoResponse {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize, Default)]
struct RelatedTopic {
    #[serde(rename = "Text")]
    text: Option<String>,
    #[serde(rename = "FirstURL")]
    first_url: Option<String>,
}
