//! JSON request/response types for the single endpoint (spec.md §6.1).

use research_core::{CredibilityTier, Source};
use research_agent::OrchestratorResult;
use serde::{Deserialize, Serialize};

const MAX_QUESTION_BYTES: usize = 4 * 1024;

/// Inbound request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchRequest {
    /// The question to research. Required, non-empty, at most 4 KiB.
    pub question: String,
    /// Upper bound on the Planner's initial query batch (1..10).
    #[serde(default = "default_initial_query_count")]
    pub initial_search_query_count: u8,
    /// Maximum Planning/Searching/Reflecting loops (1..10).
    #[serde(default = "default_max_research_loops")]
    pub max_research_loops: u8,
    /// Opaque reasoning-model token forwarded to the LM layer.
    pub reasoning_model: Option<String>,
    /// Minimum credibility tier to retain.
    #[serde(default)]
    pub source_quality_filter: SourceQualityFilter,
    /// Whether to include `filtered_sources`/`quality_summary` in the response.
    #[serde(default)]
    pub enhanced_filtering: bool,
    /// Minimum `overall` score to retain, consulted only when
    /// `enhanced_filtering` is true.
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f32,
}

fn default_initial_query_count() -> u8 {
    3
}

fn default_max_research_loops() -> u8 {
    2
}

fn default_quality_threshold() -> f32 {
    0.6
}

/// Minimum credibility tier a source must carry to be retained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceQualityFilter {
    /// No tier floor.
    #[default]
    Any,
    /// `Medium` or above.
    Medium,
    /// `High` only.
    High,
}

impl SourceQualityFilter {
    /// Maps the wire-level enum to the minimum [`CredibilityTier`] gate.
    #[must_use]
    pub const fn minimum_tier(self) -> CredibilityTier {
        match self {
            Self::Any => CredibilityTier::Low,
            Self::Medium => CredibilityTier::Medium,
            Self::High => CredibilityTier::High,
        }
    }
}

impl ResearchRequest {
    /// Validates the request against spec.md §6.1's constraints,
    /// returning a human-readable reason on failure (surfaced as a 400
    /// `RequestInvalid`).
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question must not be empty".into());
        }
        if self.question.len() > MAX_QUESTION_BYTES {
            return Err(format!("question must be at most {MAX_QUESTION_BYTES} bytes"));
        }
        if !(1..=10).contains(&self.initial_search_query_count) {
            return Err("initial_search_query_count must be in 1..=10".into());
        }
        if !(1..=10).contains(&self.max_research_loops) {
            return Err("max_research_loops must be in 1..=10".into());
        }
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err("quality_threshold must be in [0, 1]".into());
        }
        Ok(())
    }

    /// Whether this request's filters diverge from the process
    /// defaults, for the response's `filtering_applied` flag.
    #[must_use]
    pub fn filtering_applied(&self, default_threshold: f32) -> bool {
        self.source_quality_filter != SourceQualityFilter::Any || (self.quality_threshold - default_threshold).abs() > f32::EPSILON
    }
}

/// A source as exposed on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct WireSource {
    /// Source title.
    pub title: String,
    /// Canonical URL.
    pub url: String,
    /// Citation label (e.g. `"1"`), present for retained sources.
    pub label: Option<String>,
    /// Domain classification.
    pub domain_type: research_core::DomainType,
    /// Credibility tier.
    pub credibility_tier: CredibilityTier,
    /// The `overall` quality score.
    pub quality_score: f32,
    /// Full sub-score breakdown, included only when the request asked
    /// for `enhanced_filtering`.
    pub quality_breakdown: Option<QualityBreakdown>,
}

/// The five quality sub-scores (spec.md §4.3).
#[derive(Debug, Clone, Serialize)]
pub struct QualityBreakdown {
    /// Credibility sub-score.
    pub credibility: f32,
    /// Relevance sub-score.
    pub relevance: f32,
    /// Completeness sub-score.
    pub completeness: f32,
    /// Recency sub-score.
    pub recency: f32,
    /// Authority sub-score.
    pub authority: f32,
}

impl WireSource {
    fn from_source(source: &Source, include_breakdown: bool) -> Self {
        Self {
            title: source.title.clone(),
            url: source.url.clone(),
            label: source.label.clone(),
            domain_type: source.domain_type,
            credibility_tier: source.credibility_tier,
            quality_score: source.quality.overall,
            quality_breakdown: include_breakdown.then(|| QualityBreakdown {
                credibility: source.quality.credibility,
                relevance: source.quality.relevance,
                completeness: source.quality.completeness,
                recency: source.quality.recency,
                authority: source.quality.authority,
            }),
        }
    }
}

/// Summary of how many sources were retained vs. filtered out.
#[derive(Debug, Clone, Serialize)]
pub struct QualitySummary {
    /// Total sources considered (retained + filtered).
    pub total: usize,
    /// Sources retained in the response.
    pub included: usize,
    /// Sources dropped by the quality gate.
    pub filtered: usize,
    /// Mean `overall` score across all considered sources.
    pub average_overall: f32,
    /// The `quality_threshold` that was applied.
    pub threshold: f32,
}

/// Outbound response body.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchResponse {
    /// Synthesized prose answer with inline `[k]` markers.
    pub final_answer: String,
    /// Retained sources, in citation-label order.
    pub sources: Vec<WireSource>,
    /// Filtered-out sources; empty unless `enhanced_filtering` was set.
    pub filtered_sources: Vec<WireSource>,
    /// Present only when `enhanced_filtering` was set.
    pub quality_summary: Option<QualitySummary>,
    /// True iff any filter (tier or threshold) was non-default.
    pub filtering_applied: bool,
    /// Number of completed Searching phases.
    pub research_loops_executed: u32,
    /// Count of unique queries sent to the Dispatcher.
    pub total_queries: usize,
}

impl ResearchResponse {
    /// Builds the wire response from the orchestrator's result and the
    /// request that produced it.
    #[must_use]
    pub fn from_result(result: &OrchestratorResult, request: &ResearchRequest, default_threshold: f32) -> Self {
        let enhanced = request.enhanced_filtering;
        let sources: Vec<WireSource> = result.sources.iter().map(|s| WireSource::from_source(s, enhanced)).collect();
        let filtered_sources: Vec<WireSource> = if enhanced {
            result.filtered_sources.iter().map(|s| WireSource::from_source(s, enhanced)).collect()
        } else {
            Vec::new()
        };

        let quality_summary = enhanced.then(|| {
            let total = result.sources.len() + result.filtered_sources.len();
            let sum: f32 = result.sources.iter().chain(result.filtered_sources.iter()).map(|s| s.quality.overall).sum();
            QualitySummary {
                total,
                included: result.sources.len(),
                filtered: result.filtered_sources.len(),
                average_overall: if total == 0 { 0.0 } else { sum / total as f32 },
                threshold: request.quality_threshold,
            }
        });

        Self {
            final_answer: result.final_answer.answer_text.clone(),
            sources,
            filtered_sources,
            quality_summary,
            filtering_applied: request.filtering_applied(default_threshold),
            research_loops_executed: result.research_loops_executed,
            total_queries: result.total_queries,
        }
    }
}
