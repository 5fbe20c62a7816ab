//! Planner (spec.md §4.4, component C4): turns a question, and later a
//! reflection's gaps, into concrete search queries.

use std::future::Future;

use research_core::{LanguageModel, Query, QueryOrigin};
use schemars::JsonSchema;
use serde::Deserialize;

/// Context passed to a follow-up planning call.
#[derive(Debug, Clone)]
pub struct FollowUpContext<'a> {
    /// Aspects the Reflector judged still missing.
    pub missing_aspects: &'a [String],
    /// Queries already executed this session, for the Planner to avoid
    /// repeating.
    pub already_tried_queries: Vec<&'a str>,
}

/// Produces search queries for a session.
///
/// Implementations never need to enforce count bounds or drop
/// short/duplicate queries themselves — [`DefaultPlanner::plan_initial`]
/// and [`DefaultPlanner::plan_followup`] apply spec.md §4.4's validation
/// uniformly over whatever the underlying model returns.
pub trait Planner: Send + Sync {
    /// Generates the initial query batch for a fresh question.
    fn plan_initial(&self, question: &str, max_queries: usize) -> impl Future<Output = Vec<Query>> + Send;

    /// Generates a follow-up query batch after a reflection found gaps.
    /// May return an empty `Vec` to signal "no new angles" (spec.md §4.4).
    fn plan_followup(
        &self,
        question: &str,
        context: FollowUpContext<'_>,
        max_queries: usize,
        loop_index: u32,
    ) -> impl Future<Output = Vec<Query>> + Send;
}

#[derive(Debug, Deserialize, JsonSchema)]
struct PlannedQueries {
    queries: Vec<String>,
}

/// LM-backed [`Planner`] (spec.md §4.4).
///
/// On any LM failure or malformed output, both methods fall back to a
/// single query equal to the question itself for the initial call, and
/// to an empty batch for follow-ups — matching spec.md's fallback
/// policy ("the Planner emits a single fallback query equal to the
/// question itself; the session continues").
#[derive(Debug, Clone)]
pub struct DefaultPlanner<L> {
    model: L,
}

impl<L> DefaultPlanner<L> {
    /// Wraps a language model as a Planner.
    #[must_use]
    pub const fn new(model: L) -> Self {
        Self { model }
    }
}

impl<L> Planner for DefaultPlanner<L>
where
    L: LanguageModel,
{
    async fn plan_initial(&self, question: &str, max_queries: usize) -> Vec<Query> {
        let request = research_core::oneshot(
            "You are the query-planning stage of a research system. Given a \
             question, propose a small set of diverse, specific web search \
             queries that together would surface the evidence needed to \
             answer it. Return only the queries, no commentary.",
            format!("Question: {question}\nPropose up to {max_queries} search queries."),
        );

        let planned: Result<PlannedQueries, _> = self.model.generate(request).await;
        let raw_queries = match planned {
            Ok(planned) => planned.queries,
            Err(err) => {
                tracing::warn!(error = %err, "planner failed on initial call, using fallback query");
                Vec::new()
            }
        };

        let mut validated = validate(raw_queries, &[], QueryOrigin::Initial, 0);
        validated.truncate(max_queries.max(1));
        if validated.is_empty() {
            validated.push(Query::new(question, QueryOrigin::Initial, 0));
        }
        validated
    }

    async fn plan_followup(
        &self,
        question: &str,
        context: FollowUpContext<'_>,
        max_queries: usize,
        loop_index: u32,
    ) -> Vec<Query> {
        if max_queries == 0 {
            return Vec::new();
        }

        let request = research_core::oneshot(
            "You are the follow-up query-planning stage of a research system. \
             Given the original question and aspects the evidence gathered so \
             far does not cover, propose additional web search queries to \
             close those gaps. If no new angle would help, return an empty \
             list.",
            format!(
                "Question: {question}\nMissing aspects: {:?}\nAlready tried: {:?}\n\
                 Propose up to {max_queries} new search queries.",
                context.missing_aspects, context.already_tried_queries,
            ),
        );

        let planned: Result<PlannedQueries, _> = self.model.generate(request).await;
        let raw_queries = match planned {
            Ok(planned) => planned.queries,
            Err(err) => {
                tracing::warn!(error = %err, "planner failed on follow-up call, signaling no new angles");
                Vec::new()
            }
        };

        let mut validated = validate(
            raw_queries,
            &context.already_tried_queries,
            QueryOrigin::FollowUp,
            loop_index,
        );
        validated.truncate(max_queries);
        validated
    }
}

/// Trims, drops short (<2 tokens) and already-seen queries, and
/// deduplicates under normalization (spec.md §4.4 validation).
fn validate(
    raw_queries: Vec<String>,
    already_tried: &[&str],
    origin: QueryOrigin,
    loop_index: u32,
) -> Vec<Query> {
    let mut seen = already_tried
        .iter()
        .map(|q| q.trim().to_lowercase())
        .collect::<std::collections::HashSet<_>>();
    let mut out = Vec::new();
    for raw in raw_queries {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let query = Query::new(trimmed, origin, loop_index);
        if query.token_count() < 2 {
            continue;
        }
        let key = query.normalized_key();
        if !seen.insert(key) {
            continue;
        }
        out.push(query);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_core::LlmRequest;
    use std::convert::Infallible;

    struct StubModel {
        queries: Vec<&'static str>,
    }

    impl LanguageModel for StubModel {
        type Error = Infallible;

        async fn generate<T>(&self, _request: LlmRequest) -> Result<T, Self::Error>
        where
            T: serde::de::DeserializeOwned + JsonSchema + Send + 'static,
        {
            let value = serde_json::json!({ "queries": self.queries });
            Ok(serde_json::from_value(value).expect("stub payload matches T"))
        }

        async fn generate_text(&self, _request: LlmRequest) -> Result<String, Self::Error> {
            Ok(String::new())
        }
    }

    #[derive(Debug)]
    struct AlwaysFails;

    impl std::fmt::Display for AlwaysFails {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("planner model unavailable")
        }
    }
    impl std::error::Error for AlwaysFails {}

    struct FailingModel;

    impl LanguageModel for FailingModel {
        type Error = AlwaysFails;

        async fn generate<T>(&self, _request: LlmRequest) -> Result<T, Self::Error>
        where
            T: serde::de::DeserializeOwned + JsonSchema + Send + 'static,
        {
            Err(AlwaysFails)
        }

        async fn generate_text(&self, _request: LlmRequest) -> Result<String, Self::Error> {
            Err(AlwaysFails)
        }
    }

    #[tokio::test]
    async fn initial_plan_truncates_and_dedupes() {
        let planner = DefaultPlanner::new(StubModel {
            queries: vec!["Euro 2024 winner", "euro   2024 WINNER", "Euro 2024 top scorer", "x"],
        });
        let queries = planner.plan_initial("who won euro 2024", 2).await;
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].text(), "Euro 2024 winner");
    }

    #[tokio::test]
    async fn initial_plan_falls_back_to_question_on_lm_failure() {
        let planner = DefaultPlanner::new(FailingModel);
        let queries = planner.plan_initial("who won euro 2024", 3).await;
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].text(), "who won euro 2024");
    }

    #[tokio::test]
    async fn followup_plan_can_return_empty() {
        let planner = DefaultPlanner::new(StubModel { queries: vec![] });
        let context = FollowUpContext {
            missing_aspects: &["top scorer".to_string()],
            already_tried_queries: vec!["euro 2024 winner"],
        };
        let queries = planner.plan_followup("who won euro 2024", context, 2, 0).await;
        assert!(queries.is_empty());
    }

    #[tokio::test]
    async fn followup_plan_drops_already_tried_queries() {
        let planner = DefaultPlanner::new(StubModel {
            queries: vec!["euro 2024 winner", "euro 2024 top scorer"],
        });
        let context = FollowUpContext {
            missing_aspects: &["top scorer".to_string()],
            already_tried_queries: vec!["euro 2024 winner"],
        };
        let queries = planner.plan_followup("who won euro 2024", context, 2, 1).await;
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].text(), "euro 2024 top scorer");
    }
}
