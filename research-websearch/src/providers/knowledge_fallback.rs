//! [`KnowledgeFallback`]: the no-network, last-resort provider
//! (spec.md §4.1).

use research_core::{Hit, ProviderStatus, Query, SearchProvider};

/// Placeholder URL stamped on the single synthetic hit this provider
/// ever returns. Never a real, fetchable resource — downstream
/// classification treats it as `Reference`/`Low` on purpose, since
/// there is no actual source to credit.
pub const PLACEHOLDER_URL: &str = "about:no-source";

/// Last link in the fallback chain (spec.md §4.2): performs no I/O,
/// and exists purely so a session never collapses to zero sources
/// when every networked provider failed or is unconfigured.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeFallback;

impl KnowledgeFallback {
    /// Builds the fallback provider. Takes no configuration — it is
    /// always available.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SearchProvider for KnowledgeFallback {
    fn name(&self) -> &str {
        "knowledge_fallback"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn search(&self, query: &Query, _limit: usize) -> (Vec<Hit>, ProviderStatus) {
        let hit = Hit {
            title: format!("No external source available for: {}", query.text()),
            url: PLACEHOLDER_URL.to_string(),
            snippet: String::from(
                "No search provider returned results for this query. This answer \
                 relies on the model's own background knowledge and carries no \
                 independently verifiable citation.",
            ),
            provider_name: "knowledge_fallback".into(),
            published_at: None,
        };
        (vec![hit], ProviderStatus::Ok)
    }
}
