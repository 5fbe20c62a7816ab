//! Search Dispatcher (spec.md §4.2, component C2): the prioritized
//! fallback chain over configured providers.

use std::sync::Arc;
use std::time::Duration;

use research_core::{Hit, ProviderStatus, Query, SearchProvider};
use tokio::sync::Semaphore;

use crate::providers::{DuckDuckGo, GoogleCustomSearch, KnowledgeFallback, LMGrounded, SearchApi};

/// A provider slot in the dispatcher's fixed chain, together with the
/// semaphore bounding its in-flight concurrency.
struct ChainLink {
    provider: Box<dyn ErasedProvider>,
    in_flight: Arc<Semaphore>,
}

/// Object-safe shim over [`SearchProvider`], since its `search` method
/// returns an opaque `impl Future` that cannot itself be part of a
/// `dyn` trait. The five concrete providers are boxed behind this
/// instead of behind `SearchProvider` directly.
trait ErasedProvider: Send + Sync {
    fn name(&self) -> &str;
    fn is_configured(&self) -> bool;
    fn search<'a>(
        &'a self,
        query: &'a Query,
        limit: usize,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = (Vec<Hit>, ProviderStatus)> + Send + 'a>>;
}

impl<P: SearchProvider> ErasedProvider for P {
    fn name(&self) -> &str {
        SearchProvider::name(self)
    }

    fn is_configured(&self) -> bool {
        SearchProvider::is_configured(self)
    }

    fn search<'a>(
        &'a self,
        query: &'a Query,
        limit: usize,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = (Vec<Hit>, ProviderStatus)> + Send + 'a>>
    {
        Box::pin(SearchProvider::search(self, query, limit))
    }
}

/// One provider's outcome as recorded for the session's diagnostics
/// channel (spec.md §4.2: "every provider failure is recorded ...
/// but never aborts the session").
#[derive(Debug, Clone)]
pub struct ProviderAttempt {
    /// Stable provider identifier, e.g. `"duckduckgo"`.
    pub provider: String,
    /// Outcome of the call.
    pub status: ProviderStatus,
}

/// Result of dispatching one query through the fallback chain.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Hits from the first provider that returned `Ok` with non-empty
    /// results. Empty iff every provider in the chain failed or
    /// returned nothing (spec.md §4.2 step 5, `AllExhausted`).
    pub hits: Vec<Hit>,
    /// Every provider call attempted for this query, in chain order.
    pub attempts: Vec<ProviderAttempt>,
}

impl DispatchOutcome {
    /// Whether the chain was exhausted without producing any hits.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Fixed, prioritized fallback chain over the providers configured at
/// session start (spec.md §4.2).
///
/// Construction filters to `is_configured()` providers and fixes
/// their order for the session's lifetime — "The order is
/// configuration, not a hard wiring."
pub struct Dispatcher {
    chain: Vec<ChainLink>,
    per_provider_timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("providers", &self.chain.iter().map(|link| link.provider.name()).collect::<Vec<_>>())
            .field("per_provider_timeout", &self.per_provider_timeout)
            .finish()
    }
}

/// Builds the default chain in spec.md §4.2's documented priority
/// order: `LMGrounded -> GoogleCustomSearch -> SearchApi -> DuckDuckGo
/// -> KnowledgeFallback`.
#[allow(clippy::too_many_arguments)]
pub fn default_chain<L>(
    lm_grounded: LMGrounded<L>,
    google: GoogleCustomSearch,
    search_api: SearchApi,
    duckduckgo: DuckDuckGo,
    knowledge_fallback: KnowledgeFallback,
    provider_concurrency: usize,
    per_provider_timeout: Duration,
) -> Dispatcher
where
    L: research_core::LanguageModel + 'static,
{
    let candidates: Vec<Box<dyn ErasedProvider>> = vec![
        Box::new(lm_grounded),
        Box::new(google),
        Box::new(search_api),
        Box::new(duckduckgo),
        Box::new(knowledge_fallback),
    ];
    Dispatcher::from_erased(candidates, provider_concurrency, per_provider_timeout)
}

impl Dispatcher {
    fn from_erased(
        candidates: Vec<Box<dyn ErasedProvider>>,
        provider_concurrency: usize,
        per_provider_timeout: Duration,
    ) -> Self {
        let chain = candidates
            .into_iter()
            .filter(|provider| provider.is_configured())
            .map(|provider| ChainLink {
                provider,
                in_flight: Arc::new(Semaphore::new(provider_concurrency.max(1))),
            })
            .collect();
        Self {
            chain,
            per_provider_timeout,
        }
    }

    /// Runs `query` through the fallback chain (spec.md §4.2
    /// algorithm): stops at the first provider returning `Ok` with
    /// non-empty hits, otherwise records the failure and continues.
    pub async fn dispatch(&self, query: &Query, limit: usize) -> DispatchOutcome {
        let limit = limit.clamp(1, 20);
        let mut attempts = Vec::with_capacity(self.chain.len());

        for link in &self.chain {
            let Ok(_permit) = tokio::time::timeout(
                self.per_provider_timeout,
                link.in_flight.acquire(),
            )
            .await
            else {
                attempts.push(ProviderAttempt {
                    provider: link.provider.name().to_string(),
                    status: ProviderStatus::Timeout,
                });
                continue;
            };

            let call = tokio::time::timeout(self.per_provider_timeout, link.provider.search(query, limit));
            let (hits, status) = match call.await {
                Ok(outcome) => outcome,
                Err(_) => (Vec::new(), ProviderStatus::Timeout),
            };

            attempts.push(ProviderAttempt {
                provider: link.provider.name().to_string(),
                status,
            });

            if status.is_usable() && !hits.is_empty() {
                tracing::debug!(provider = link.provider.name(), hits = hits.len(), "dispatch succeeded");
                return DispatchOutcome { hits, attempts };
            }

            tracing::warn!(provider = link.provider.name(), ?status, "provider did not yield hits, falling back");
        }

        DispatchOutcome { hits: Vec::new(), attempts }
    }
}
