//! Reflector (spec.md §4.5, component C5): judges whether the
//! retained evidence answers the question.

use std::future::Future;

use research_core::{LanguageModel, Source};
use schemars::JsonSchema;
use serde::Deserialize;

/// Outcome of a reflection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Reflection {
    /// Whether current evidence is judged sufficient.
    pub is_complete: bool,
    /// Ordered, possibly empty, list of gaps still open.
    pub missing_aspects: Vec<String>,
    /// Telemetry-only score in `[0, 1]`; never a gate by itself
    /// (spec.md §4.5).
    pub completeness_score: f32,
}

impl Reflection {
    /// The safe-failure reflection (spec.md §4.5 "Policy on Reflector
    /// failure"): complete, no gaps, zero score.
    #[must_use]
    pub fn failed_safe() -> Self {
        Self {
            is_complete: true,
            missing_aspects: Vec::new(),
            completeness_score: 0.0,
        }
    }
}

/// Decides whether the evidence gathered so far is sufficient.
pub trait Reflector: Send + Sync {
    /// Reflects on the *retained* subset of sources for `question`.
    fn reflect(&self, question: &str, retained_sources: &[Source]) -> impl Future<Output = Reflection> + Send;
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ReflectionPayload {
    is_complete: bool,
    #[serde(default)]
    missing_aspects: Vec<String>,
    #[serde(default)]
    completeness_score: f32,
}

/// LM-backed [`Reflector`] (spec.md §4.5).
#[derive(Debug, Clone)]
pub struct DefaultReflector<L> {
    model: L,
}

impl<L> DefaultReflector<L> {
    /// Wraps a language model as a Reflector.
    #[must_use]
    pub const fn new(model: L) -> Self {
        Self { model }
    }
}

impl<L> Reflector for DefaultReflector<L>
where
    L: LanguageModel,
{
    async fn reflect(&self, question: &str, retained_sources: &[Source]) -> Reflection {
        let summary: Vec<String> = retained_sources
            .iter()
            .map(|source| format!("- {} ({})", source.title, source.url))
            .collect();

        let request = research_core::oneshot(
            "You are the reflection stage of a research system. Given a \
             question and the titles/URLs of sources gathered so far, decide \
             whether the evidence is sufficient to answer the question \
             thoroughly. List any aspects that remain uncovered.",
            format!(
                "Question: {question}\nSources gathered ({}):\n{}",
                retained_sources.len(),
                summary.join("\n"),
            ),
        );

        match self.model.generate::<ReflectionPayload>(request).await {
            Ok(payload) => Reflection {
                is_complete: payload.is_complete,
                missing_aspects: payload.missing_aspects,
                completeness_score: payload.completeness_score.clamp(0.0, 1.0),
            },
            Err(err) => {
                tracing::warn!(error = %err, "reflector failed, ending loop safely");
                Reflection::failed_safe()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_core::{CredibilityTier, DomainType, LlmRequest, Quality};

    struct StubModel {
        payload: serde_json::Value,
    }

    impl LanguageModel for StubModel {
        type Error = std::convert::Infallible;

        async fn generate<T>(&self, _request: LlmRequest) -> Result<T, Self::Error>
        where
            T: serde::de::DeserializeOwned + JsonSchema + Send + 'static,
        {
            Ok(serde_json::from_value(self.payload.clone()).expect("stub payload matches T"))
        }

        async fn generate_text(&self, _request: LlmRequest) -> Result<String, Self::Error> {
            Ok(String::new())
        }
    }

    #[derive(Debug)]
    struct AlwaysFails;
    impl std::fmt::Display for AlwaysFails {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("reflector model unavailable")
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

    fn sample_source() -> Source {
        Source {
            url: "https://example.com".into(),
            title: "t".into(),
            snippet: "s".into(),
            domain_type: DomainType::Commercial,
            credibility_tier: CredibilityTier::Medium,
            quality: Quality {
                credibility: 0.7,
                relevance: 0.7,
                completeness: 0.7,
                recency: 0.7,
                authority: 0.7,
                overall: 0.7,
            },
            first_provider: "p".into(),
            label: None,
        }
    }

    #[tokio::test]
    async fn reports_gaps_from_model_output() {
        let model = StubModel {
            payload: serde_json::json!({
                "is_complete": false,
                "missing_aspects": ["top scorer"],
                "completeness_score": 0.6,
            }),
        };
        let reflector = DefaultReflector::new(model);
        let reflection = reflector.reflect("q", &[sample_source()]).await;
        assert!(!reflection.is_complete);
        assert_eq!(reflection.missing_aspects, vec!["top scorer".to_string()]);
        assert!((reflection.completeness_score - 0.6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn fails_safe_on_model_error() {
        let reflector = DefaultReflector::new(FailingModel);
        let reflection = reflector.reflect("q", &[sample_source()]).await;
        assert_eq!(reflection, Reflection::failed_safe());
    }
}
