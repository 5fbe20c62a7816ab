//! Session Orchestrator (spec.md §4.6, component C6): the
//! Planning -> Searching -> Reflecting -> Finalizing state machine.

use std::sync::Arc;
use std::time::Duration;

use research_core::{Phase, Query, Session, Source};
use research_websearch::Dispatcher;
use tokio::sync::Semaphore;

use crate::finalizer::{FinalAnswer, Finalizer};
use crate::planner::{FollowUpContext, Planner};
use crate::reflector::Reflector;

/// Everything the Orchestrator produced for one session, ready to be
/// rendered onto the wire format (spec.md §6.1).
#[derive(Debug, Clone)]
pub struct OrchestratorResult {
    /// The synthesized, citation-checked answer.
    pub final_answer: FinalAnswer,
    /// Retained sources, labeled, in citation-label order.
    pub sources: Vec<Source>,
    /// Filtered-out sources, unlabeled, kept for transparency.
    pub filtered_sources: Vec<Source>,
    /// Number of completed Searching phases; `1..=config.max_loops`.
    pub research_loops_executed: u32,
    /// Count of unique queries sent to the Dispatcher this session.
    pub total_queries: usize,
}

/// Runs the full research loop over a [`Session`] (spec.md §4.6).
///
/// Generic over the three LM-backed roles and the concrete
/// [`Dispatcher`], so a caller can plug in stub implementations for
/// tests without touching this module.
pub struct Orchestrator<P, R, F> {
    planner: P,
    reflector: R,
    finalizer: F,
    dispatcher: Arc<Dispatcher>,
}

impl<P, R, F> Orchestrator<P, R, F>
where
    P: Planner,
    R: Reflector,
    F: Finalizer,
{
    /// Builds an orchestrator from its three LM-backed roles and a
    /// shared dispatcher.
    #[must_use]
    pub fn new(planner: P, reflector: R, finalizer: F, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            planner,
            reflector,
            finalizer,
            dispatcher,
        }
    }

    /// Drives `session` from `Planning` through to `Done`, mutating it
    /// in place and returning the externally visible result.
    ///
    /// Only this method ever mutates `session`'s fields directly;
    /// every search/LM call below returns a value that is merged back
    /// in serially, so no two tasks ever touch `session` at once
    /// (spec.md §5).
    pub async fn run(&self, session: &mut Session) -> OrchestratorResult {
        session.phase = Phase::Planning;
        tracing::info!(session_id = %session.id, loop_index = session.loop_index, phase = ?session.phase, "phase transition");
        let mut next_queries = self
            .planner
            .plan_initial(&session.question, session.config.initial_query_count as usize)
            .await;

        let mut loops_executed = 0_u32;

        loop {
            if session.deadline_exceeded() {
                break;
            }

            let fresh: Vec<Query> = next_queries
                .into_iter()
                .filter(|query| session.record_query(query.clone()))
                .collect();

            session.phase = Phase::Searching;
            tracing::info!(session_id = %session.id, loop_index = session.loop_index, phase = ?session.phase, new_queries = fresh.len(), "phase transition");
            if !fresh.is_empty() {
                self.search_and_merge(session, &fresh).await;
                session.enforce_source_budget();
            }
            loops_executed += 1;

            if session.deadline_exceeded() {
                break;
            }

            session.phase = Phase::Reflecting;
            tracing::info!(session_id = %session.id, loop_index = session.loop_index, phase = ?session.phase, "phase transition");
            let retained = retained_sources(session);
            let reflection = self.reflector.reflect(&session.question, &retained).await;
            session.loop_index += 1;

            if reflection.is_complete || session.loop_index >= u32::from(session.config.max_loops) {
                break;
            }

            let already_tried: Vec<&str> = session.queries_executed().map(Query::text).collect();
            let context = FollowUpContext {
                missing_aspects: &reflection.missing_aspects,
                already_tried_queries: already_tried,
            };
            let followups = self
                .planner
                .plan_followup(
                    &session.question,
                    context,
                    session.config.followup_query_count as usize,
                    session.loop_index,
                )
                .await;

            if followups.is_empty() {
                break;
            }
            next_queries = followups;
        }

        session.phase = Phase::Finalizing;
        tracing::info!(session_id = %session.id, loop_index = session.loop_index, phase = ?session.phase, "phase transition");
        let (labeled_retained, filtered) = assign_citation_labels(session);
        let final_answer = self.finalizer.finalize(&session.question, &labeled_retained).await;
        session.phase = Phase::Done;
        tracing::info!(session_id = %session.id, loop_index = session.loop_index, phase = ?session.phase, research_loops_executed = loops_executed.max(1), "phase transition");

        OrchestratorResult {
            final_answer,
            sources: labeled_retained,
            filtered_sources: filtered,
            research_loops_executed: loops_executed.max(1),
            total_queries: session.query_count(),
        }
    }

    /// Fans `queries` out through the Dispatcher, bounded by
    /// `config.parallel_searches`, and merges every resulting hit into
    /// `session.sources` (spec.md §4.6 step 2).
    ///
    /// A query whose dispatch does not complete before the session
    /// deadline is simply never awaited to completion: its task is
    /// detached and any hits it would have produced are discarded,
    /// matching spec.md §5's cancellation semantics.
    async fn search_and_merge(&self, session: &mut Session, queries: &[Query]) {
        let permits = Arc::new(Semaphore::new(session.config.parallel_searches.max(1)));
        let per_query_limit = session.config.per_query_limit;

        let mut handles = Vec::with_capacity(queries.len());
        for query in queries.iter().cloned() {
            let dispatcher = Arc::clone(&self.dispatcher);
            let permits = Arc::clone(&permits);
            handles.push(tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let outcome = dispatcher.dispatch(&query, per_query_limit).await;
                (query, outcome)
            }));
        }

        for handle in handles {
            let remaining = session.time_remaining().max(Duration::from_millis(1));
            let Ok(Ok((query, outcome))) = tokio::time::timeout(remaining, handle).await else {
                tracing::warn!("query dispatch cancelled at session deadline");
                continue;
            };

            for attempt in &outcome.attempts {
                if !attempt.status.is_usable() {
                    tracing::debug!(provider = %attempt.provider, status = ?attempt.status, query = query.text(), "provider attempt failed");
                }
            }

            let mut merged = 0;
            for hit in &outcome.hits {
                if let Some(source) = research_quality::build_source(hit, &session.question) {
                    if session.merge_source(source) {
                        merged += 1;
                    }
                }
            }
            tracing::debug!(query = query.text(), merged, "searching phase merged sources");
        }
    }
}

fn retained_sources(session: &Session) -> Vec<Source> {
    session
        .sources()
        .filter(|source| source.is_retained(session.config.quality_threshold, session.config.minimum_tier))
        .cloned()
        .collect()
}

/// Splits `session.sources()` into (retained, filtered) and assigns
/// sequential `"1"`, `"2"`, ... labels to the retained set in their
/// insertion order (spec.md §5: insertion order "determines citation
/// labels").
fn assign_citation_labels(session: &mut Session) -> (Vec<Source>, Vec<Source>) {
    let threshold = session.config.quality_threshold;
    let minimum_tier = session.config.minimum_tier;
    let urls: Vec<String> = session.sources().map(|source| source.url.clone()).collect();

    let mut retained = Vec::new();
    let mut filtered = Vec::new();
    let mut next_label = 1_u32;

    for url in urls {
        let is_retained = session
            .source_mut(&url)
            .map(|source| source.is_retained(threshold, minimum_tier))
            .unwrap_or(false);

        if is_retained {
            if let Some(source) = session.source_mut(&url) {
                source.label = Some(next_label.to_string());
                next_label += 1;
                retained.push(source.clone());
            }
        } else if let Some(source) = session.source_mut(&url) {
            filtered.push(source.clone());
        }
    }

    (retained, filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_core::{CredibilityTier, Hit, ProviderStatus, QueryOrigin, SearchProvider, SessionConfig};
    use research_websearch::{default_chain, DuckDuckGo, GoogleCustomSearch, KnowledgeFallback, LMGrounded, SearchApi};

    use crate::finalizer::DefaultFinalizer;
    use crate::planner::DefaultPlanner;
    use crate::reflector::DefaultReflector;

    #[derive(Debug)]
    struct ModelUnavailable;
    impl std::fmt::Display for ModelUnavailable {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("model unavailable")
        }
    }
    impl std::error::Error for ModelUnavailable {}

    #[derive(Clone)]
    struct NoModel;
    impl research_core::LanguageModel for NoModel {
        type Error = ModelUnavailable;

        async fn generate<T>(&self, _request: research_core::LlmRequest) -> Result<T, Self::Error>
        where
            T: serde::de::DeserializeOwned + schemars::JsonSchema + Send + 'static,
        {
            Err(ModelUnavailable)
        }

        async fn generate_text(&self, _request: research_core::LlmRequest) -> Result<String, Self::Error> {
            Err(ModelUnavailable)
        }
    }

    #[derive(Clone, Default)]
    struct StubDuckDuckGo;

    impl SearchProvider for StubDuckDuckGo {
        fn name(&self) -> &str {
            "duckduckgo"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn search(&self, query: &research_core::Query, _limit: usize) -> (Vec<Hit>, ProviderStatus) {
            (
                vec![Hit {
                    title: format!("Result for {}", query.text()),
                    url: format!("https://example.com/{}", query.normalized_key().replace(' ', "-")),
                    snippet: "A sufficiently long snippet describing the search result in enough \
                              detail to score reasonably well on completeness."
                        .into(),
                    provider_name: "duckduckgo".into(),
                    published_at: None,
                }],
                ProviderStatus::Ok,
            )
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn single_loop_run_produces_a_non_empty_answer() {
        let dispatcher = default_chain(
            LMGrounded::new(NoModel),
            GoogleCustomSearch::new("", ""),
            SearchApi::new(""),
            StubDuckDuckGo,
            KnowledgeFallback::new(),
            4,
            Duration::from_secs(5),
        );

        let orchestrator = Orchestrator::new(
            DefaultPlanner::new(NoModel),
            DefaultReflector::new(NoModel),
            DefaultFinalizer::new(NoModel),
            Arc::new(dispatcher),
        );

        let mut config = SessionConfig::defaults();
        config.max_loops = 1;
        config.quality_threshold = 0.0;
        config.minimum_tier = CredibilityTier::Low;
        let mut session = Session::new("s1", "who won euro 2024", config);

        let result = orchestrator.run(&mut session).await;

        assert_eq!(result.research_loops_executed, 1);
        assert!(session.query_count() >= 1);
        assert!(!result.final_answer.answer_text.is_empty());
        assert_eq!(session.phase, Phase::Done);
    }

    #[test]
    fn query_origin_is_reexported_for_other_modules() {
        let _ = QueryOrigin::Initial;
    }

    /// A model that always reports the reflection as incomplete but
    /// never proposes a follow-up query, by returning the same payload
    /// for every `generate::<T>` call regardless of `T` (unknown fields
    /// are ignored by `serde` on both target structs).
    #[derive(Clone)]
    struct IncompleteWithNoFollowups;
    impl research_core::LanguageModel for IncompleteWithNoFollowups {
        type Error = ModelUnavailable;

        async fn generate<T>(&self, _request: research_core::LlmRequest) -> Result<T, Self::Error>
        where
            T: serde::de::DeserializeOwned + schemars::JsonSchema + Send + 'static,
        {
            let value = serde_json::json!({
                "queries": [],
                "is_complete": false,
                "missing_aspects": ["top scorer"],
                "completeness_score": 0.4,
            });
            Ok(serde_json::from_value(value).expect("stub payload matches either target shape"))
        }

        async fn generate_text(&self, _request: research_core::LlmRequest) -> Result<String, Self::Error> {
            Ok(String::new())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_followup_ends_the_loop_without_a_second_searching_phase() {
        let dispatcher = default_chain(
            LMGrounded::new(IncompleteWithNoFollowups),
            GoogleCustomSearch::new("", ""),
            SearchApi::new(""),
            StubDuckDuckGo,
            KnowledgeFallback::new(),
            4,
            Duration::from_secs(5),
        );

        let orchestrator = Orchestrator::new(
            DefaultPlanner::new(IncompleteWithNoFollowups),
            DefaultReflector::new(IncompleteWithNoFollowups),
            DefaultFinalizer::new(IncompleteWithNoFollowups),
            Arc::new(dispatcher),
        );

        let mut config = SessionConfig::defaults();
        config.max_loops = 2;
        config.quality_threshold = 0.0;
        config.minimum_tier = CredibilityTier::Low;
        let mut session = Session::new("s2", "who won euro 2024", config);

        let result = orchestrator.run(&mut session).await;

        assert_eq!(result.research_loops_executed, 1);
        assert_eq!(session.phase, Phase::Done);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn a_source_returned_twice_under_different_urls_across_loops_is_merged_once() {
        #[derive(Clone, Default)]
        struct FirstLoopVariant;
        impl SearchProvider for FirstLoopVariant {
            fn name(&self) -> &str {
                "duckduckgo"
            }
            fn is_configured(&self) -> bool {
                true
            }
            async fn search(&self, _query: &research_core::Query, _limit: usize) -> (Vec<Hit>, ProviderStatus) {
                (
                    vec![Hit {
                        title: "Example A".into(),
                        url: "https://example.com/a?utm_source=newsletter".into(),
                        snippet: "A sufficiently long snippet describing the search result in detail.".into(),
                        provider_name: "duckduckgo".into(),
                        published_at: None,
                    }],
                    ProviderStatus::Ok,
                )
            }
        }

        let dispatcher = default_chain(
            LMGrounded::new(NoModel),
            GoogleCustomSearch::new("", ""),
            SearchApi::new(""),
            FirstLoopVariant,
            KnowledgeFallback::new(),
            4,
            Duration::from_secs(5),
        );

        let mut config = SessionConfig::defaults();
        config.quality_threshold = 0.0;
        config.minimum_tier = CredibilityTier::Low;
        let mut session = Session::new("s3", "who won euro 2024", config);

        // First loop: merges the tracked URL variant directly, bypassing
        // the Planner/Reflector roles this test does not exercise.
        let query = Query::new("who won euro 2024", QueryOrigin::Initial, 0);
        session.record_query(query.clone());
        let outcome = dispatcher.dispatch(&query, 10).await;
        for hit in &outcome.hits {
            if let Some(source) = research_quality::build_source(hit, &session.question) {
                session.merge_source(source);
            }
        }
        assert_eq!(session.source_count(), 1);

        // Second loop: a different provider returns the same page under
        // its un-tracked, trailing-slash form.
        if let Some(source) = research_quality::build_source(
            &Hit {
                title: "Example A, mirrored".into(),
                url: "http://example.com/a/".into(),
                snippet: "A sufficiently long snippet describing the search result in detail.".into(),
                provider_name: "searchapi".into(),
                published_at: None,
            },
            &session.question,
        ) {
            session.merge_source(source);
        }

        assert_eq!(session.source_count(), 1, "both URL forms canonicalize to the same source");
        let merged = session.sources().next().expect("one source");
        assert_eq!(merged.first_provider, "duckduckgo", "first writer wins");
    }
}
