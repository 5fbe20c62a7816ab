//! [`LMGrounded`]: a provider backed by a language model's own
//! search-grounding facility (spec.md §4.1).

use research_core::{Hit, LanguageModel, ProviderStatus, Query, SearchProvider};
use schemars::JsonSchema;
use serde::Deserialize;

/// Wraps a [`LanguageModel`] whose provider performs its own web
/// grounding (e.g. a "search" tool built into the model's hosted
/// inference API) and reports the grounded citations back as
/// structured output.
///
/// Hits from this provider may carry a URL the upstream model
/// furnished loosely (tracking parameters, odd casing); the usual
/// `research-quality` canonicalization step resolves that, same as
/// for any other provider.
#[derive(Debug, Clone)]
pub struct LMGrounded<L> {
    model: L,
}

impl<L> LMGrounded<L> {
    /// Wraps a language model as a search provider. Always
    /// "configured" — whether it can actually answer is a property of
    /// the model behind it, discovered at call time.
    #[must_use]
    pub const fn new(model: L) -> Self {
        Self { model }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GroundedResults {
    hits: Vec<GroundedHit>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GroundedHit {
    title: String,
    url: String,
    snippet: String,
}

impl<L> SearchProvider for LMGrounded<L>
where
    L: LanguageModel,
{
    fn name(&self) -> &str {
        "lm_grounded"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn search(&self, query: &Query, limit: usize) -> (Vec<Hit>, ProviderStatus) {
        let request = research_core::oneshot(
            "You have access to live web search grounding. Search the web for the \
             user's query and return the most relevant results as structured data. \
             Do not fabricate URLs you did not actually retrieve.",
            format!("Search query: {}\nReturn at most {limit} results.", query.text()),
        );

        let result: Result<GroundedResults, _> = self.model.generate(request).await;
        let Ok(parsed) = result else {
            return (Vec::new(), ProviderStatus::Upstream5xx);
        };

        let hits: Vec<Hit> = parsed
            .hits
            .into_iter()
            .take(limit)
            .map(|hit| Hit {
                title: hit.title,
                url: hit.url,
                snippet: hit.snippet,
                provider_name: "lm_grounded".into(),
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
