//! Finalizer (spec.md §4.7, component C7): synthesizes the cited
//! answer from the retained source set.

use std::collections::HashSet;
use std::future::Future;

use research_core::{LanguageModel, Source};
use schemars::JsonSchema;
use serde::Deserialize;

/// The Finalizer's output: a citation round-trip-safe answer
/// (spec.md §4.7 invariant 4).
#[derive(Debug, Clone, PartialEq)]
pub struct FinalAnswer {
    /// Prose answer, containing `[k]` markers referencing
    /// `citation_labels_used`.
    pub answer_text: String,
    /// Every label referenced by `answer_text`, each appearing there
    /// at least once.
    pub citation_labels_used: Vec<String>,
    /// `0` if no retained sources, else the mean `overall` of cited
    /// sources.
    pub confidence: f32,
}

/// Synthesizes the final answer from retained, labeled sources.
pub trait Finalizer: Send + Sync {
    /// `retained_sources` must already carry their citation `label`
    /// (assigned by the Orchestrator in first-cited order).
    fn finalize(&self, question: &str, retained_sources: &[Source]) -> impl Future<Output = FinalAnswer> + Send;
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FinalizerPayload {
    answer_text: String,
}

/// LM-backed [`Finalizer`] (spec.md §4.7).
#[derive(Debug, Clone)]
pub struct DefaultFinalizer<L> {
    model: L,
}

impl<L> DefaultFinalizer<L> {
    /// Wraps a language model as a Finalizer.
    #[must_use]
    pub const fn new(model: L) -> Self {
        Self { model }
    }
}

impl<L> Finalizer for DefaultFinalizer<L>
where
    L: LanguageModel,
{
    async fn finalize(&self, question: &str, retained_sources: &[Source]) -> FinalAnswer {
        if retained_sources.is_empty() {
            return low_confidence_template(question, retained_sources);
        }

        let catalog: Vec<String> = retained_sources
            .iter()
            .map(|source| {
                format!(
                    "[{}] {} — {}",
                    source.label.as_deref().unwrap_or("?"),
                    source.title,
                    source.url,
                )
            })
            .collect();

        let request = research_core::oneshot(
            "You are the synthesis stage of a research system. Write a \
             thorough answer to the question, citing sources inline with \
             `[k]` markers that match the labels given. Only cite labels \
             that were provided to you.",
            format!("Question: {question}\nSources:\n{}", catalog.join("\n")),
        );

        match self.model.generate_text(request).await {
            Ok(raw_answer) => post_process(&raw_answer, retained_sources),
            Err(err) => {
                tracing::warn!(error = %err, "finalizer failed, emitting template answer");
                failure_template(question, retained_sources)
            }
        }
    }
}

/// Strips `[k]` markers that don't correspond to a known label and
/// drops labels from `citation_labels_used` that never actually
/// appear in the text, enforcing spec.md §4.7's round-trip invariant.
fn post_process(raw_answer: &str, retained_sources: &[Source]) -> FinalAnswer {
    let known_labels: HashSet<&str> = retained_sources
        .iter()
        .filter_map(|source| source.label.as_deref())
        .collect();

    let cleaned = strip_unknown_markers(raw_answer, &known_labels);

    let mut used = Vec::new();
    let mut seen = HashSet::new();
    for label in extract_markers(&cleaned) {
        if known_labels.contains(label.as_str()) && seen.insert(label.clone()) {
            used.push(label);
        }
    }

    let confidence = mean_overall(retained_sources, &used);

    FinalAnswer {
        answer_text: cleaned,
        citation_labels_used: used,
        confidence,
    }
}

fn strip_unknown_markers(text: &str, known_labels: &HashSet<&str>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '[' {
            if let Some(end) = text[idx..].find(']') {
                let label = &text[idx + 1..idx + end];
                if known_labels.contains(label) {
                    out.push_str(&text[idx..idx + end + 1]);
                }
                for _ in 0..end {
                    chars.next();
                }
                continue;
            }
        }
        out.push(ch);
    }
    out
}

fn extract_markers(text: &str) -> Vec<String> {
    let mut markers = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('[') {
        let after = &rest[start + 1..];
        if let Some(end) = after.find(']') {
            markers.push(after[..end].to_string());
            rest = &after[end + 1..];
        } else {
            break;
        }
    }
    markers
}

fn mean_overall(retained_sources: &[Source], used_labels: &[String]) -> f32 {
    if used_labels.is_empty() {
        return 0.0;
    }
    let cited: Vec<f32> = retained_sources
        .iter()
        .filter(|source| source.label.as_deref().is_some_and(|label| used_labels.iter().any(|l| l == label)))
        .map(|source| source.quality.overall)
        .collect();
    if cited.is_empty() {
        0.0
    } else {
        cited.iter().sum::<f32>() / cited.len() as f32
    }
}

/// Deterministic fallback when the Finalizer's LM call fails
/// (spec.md §4.7 "Failure semantics"): lists up to 5 retained sources
/// ranked by `overall` and notes synthesis failed.
fn failure_template(question: &str, retained_sources: &[Source]) -> FinalAnswer {
    let mut ranked: Vec<&Source> = retained_sources.iter().collect();
    ranked.sort_by(|a, b| b.quality.overall.total_cmp(&a.quality.overall));
    ranked.truncate(5);

    let mut answer = format!(
        "Automated synthesis failed for the question: \"{question}\". \
         The following sources were retained and may help answer it directly:\n"
    );
    let mut used = Vec::new();
    for source in &ranked {
        if let Some(label) = &source.label {
            answer.push_str(&format!("[{label}] {} — {}\n", source.title, source.url));
            used.push(label.clone());
        }
    }

    let confidence = mean_overall(retained_sources, &used);
    FinalAnswer {
        answer_text: answer,
        citation_labels_used: used,
        confidence,
    }
}

/// Zero-source case (spec.md §4.6 "A session never returns
/// empty-handed"): a low-confidence answer with no citations.
fn low_confidence_template(question: &str, retained_sources: &[Source]) -> FinalAnswer {
    debug_assert!(retained_sources.is_empty());
    FinalAnswer {
        answer_text: format!(
            "No sufficiently credible sources were found for: \"{question}\". \
             This response could not be grounded in retrieved evidence."
        ),
        citation_labels_used: Vec::new(),
        confidence: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_core::{CredibilityTier, DomainType, LlmRequest, Quality};

    struct StubModel {
        answer: String,
    }

    impl LanguageModel for StubModel {
        type Error = std::convert::Infallible;

        async fn generate<T>(&self, _request: LlmRequest) -> Result<T, Self::Error>
        where
            T: serde::de::DeserializeOwned + JsonSchema + Send + 'static,
        {
            unreachable!("finalizer only uses generate_text")
        }

        async fn generate_text(&self, _request: LlmRequest) -> Result<String, Self::Error> {
            Ok(self.answer.clone())
        }
    }

    #[derive(Debug)]
    struct AlwaysFails;
    impl std::fmt::Display for AlwaysFails {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("finalizer model unavailable")
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

    fn labeled_source(label: &str, overall: f32) -> Source {
        Source {
            url: format!("https://example.com/{label}"),
            title: format!("Source {label}"),
            snippet: "s".into(),
            domain_type: DomainType::Commercial,
            credibility_tier: CredibilityTier::Medium,
            quality: Quality {
                credibility: 0.7,
                relevance: 0.7,
                completeness: 0.7,
                recency: 0.7,
                authority: 0.7,
                overall,
            },
            first_provider: "p".into(),
            label: Some(label.to_string()),
        }
    }

    #[tokio::test]
    async fn zero_sources_returns_low_confidence_without_calling_model() {
        let finalizer = DefaultFinalizer::new(FailingModel);
        let answer = finalizer.finalize("q", &[]).await;
        assert_eq!(answer.confidence, 0.0);
        assert!(answer.citation_labels_used.is_empty());
    }

    #[tokio::test]
    async fn strips_unknown_markers_and_drops_unused_labels() {
        let sources = vec![labeled_source("1", 0.8), labeled_source("2", 0.6)];
        let model = StubModel {
            answer: "The result is clear [1][9] and well documented.".into(),
        };
        let finalizer = DefaultFinalizer::new(model);
        let answer = finalizer.finalize("q", &sources).await;
        assert_eq!(answer.citation_labels_used, vec!["1".to_string()]);
        assert!(!answer.answer_text.contains("[9]"));
        assert!((answer.confidence - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn failure_template_ranks_sources_by_overall() {
        let sources = vec![labeled_source("1", 0.3), labeled_source("2", 0.9)];
        let finalizer = DefaultFinalizer::new(FailingModel);
        let answer = finalizer.finalize("q", &sources).await;
        assert_eq!(answer.citation_labels_used, vec!["2".to_string(), "1".to_string()]);
    }
}
