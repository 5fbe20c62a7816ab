//! Value types shared across the research control plane: queries, raw
//! search hits, and the scored/classified sources that accumulate in a
//! [`crate::Session`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a [`Query`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryOrigin {
    /// Produced by the Planner's initial call.
    Initial,
    /// Produced by the Planner's follow-up call after a reflection.
    FollowUp,
}

/// A normalized search query, immutable once constructed.
///
/// `text` is trimmed, whitespace-collapsed, and case-folded for dedup
/// purposes only — the original casing is preserved for display and for
/// the actual provider call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    text: String,
    origin: QueryOrigin,
    loop_index: u32,
}

impl Query {
    /// Builds a query, normalizing `text` (trim + collapse internal
    /// whitespace). The original casing is retained; use
    /// [`Query::normalized_key`] for dedup comparisons.
    #[must_use]
    pub fn new(text: impl Into<String>, origin: QueryOrigin, loop_index: u32) -> Self {
        let collapsed = collapse_whitespace(text.into().trim());
        Self {
            text: collapsed,
            origin,
            loop_index,
        }
    }

    /// The query text as it will be sent to providers.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Origin of this query.
    #[must_use]
    pub const fn origin(&self) -> QueryOrigin {
        self.origin
    }

    /// Loop this query was generated in.
    #[must_use]
    pub const fn loop_index(&self) -> u32 {
        self.loop_index
    }

    /// Number of whitespace-separated tokens after normalization.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Case-folded key used for deduplication against `queries_executed`.
    #[must_use]
    pub fn normalized_key(&self) -> String {
        self.text.to_lowercase()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One candidate result returned by a single provider call, before
/// deduplication, classification, and scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    /// Title as reported by the provider.
    pub title: String,
    /// URL as reported by the provider (not yet canonicalized).
    pub url: String,
    /// Snippet / abstract text.
    pub snippet: String,
    /// Name of the provider that produced this hit.
    pub provider_name: String,
    /// Publication timestamp, if the provider supplied one.
    pub published_at: Option<DateTime<Utc>>,
}

/// Coarse classification of a source's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    /// `.edu`, `.ac.*`, and explicitly allow-listed research hosts.
    Academic,
    /// News allowlist or broad news-domain heuristic.
    News,
    /// `.gov`, `.mil`, and intergovernmental organizations.
    Official,
    /// Everything commercial, by default or upgraded via an allowlist.
    Commercial,
    /// Encyclopedic reference sources (Wikipedia and peers).
    Reference,
    /// Anything that does not fit the above.
    Other,
}

/// Credibility tier assigned during classification.
///
/// Ordered `Low < Medium < High` so that "minimum tier" filtering
/// (`source_quality_filter`) can be expressed with a plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredibilityTier {
    /// Ordered first so that `Low < Medium < High`.
    Low,
    /// Middle tier.
    Medium,
    /// Highest tier.
    High,
}

impl CredibilityTier {
    /// Base credibility sub-score for this tier (spec.md §4.3).
    #[must_use]
    pub const fn credibility_weight(self) -> f32 {
        match self {
            Self::High => 1.0,
            Self::Medium => 0.7,
            Self::Low => 0.4,
        }
    }
}

/// The five quality sub-scores plus the weighted `overall`, each in
/// `[0, 1]`. See spec.md §4.3 for the exact weighting formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quality {
    /// Mapped from [`CredibilityTier`].
    pub credibility: f32,
    /// Token-overlap relevance against the question.
    pub relevance: f32,
    /// Monotone function of snippet length.
    pub completeness: f32,
    /// Recency bucket based on `published_at`.
    pub recency: f32,
    /// Credibility with a bonus for Academic/Official domains.
    pub authority: f32,
    /// Weighted mean of the five sub-scores above.
    pub overall: f32,
}

/// A deduplicated, classified, and scored hit merged into a session.
///
/// Mutable while a session is accumulating sources; treated as immutable
/// once the session reaches `Finalizing` (citation `label` is the only
/// field assigned that late).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Canonical URL — the sole dedup key (spec.md §4.3, invariant 1).
    pub url: String,
    /// Title, normally taken from the first hit that produced this source.
    pub title: String,
    /// Snippet, normally taken from the first hit that produced this source.
    pub snippet: String,
    /// Domain classification.
    pub domain_type: DomainType,
    /// Credibility tier.
    pub credibility_tier: CredibilityTier,
    /// Quality sub-scores and overall score.
    pub quality: Quality,
    /// Name of the provider that first supplied this source
    /// (first-write-wins on collision, spec.md §4.6 step 2).
    pub first_provider: String,
    /// Citation marker assigned at finalization (e.g. `"1"` for `[1]`).
    pub label: Option<String>,
}

impl Source {
    /// Whether this source passes the filter predicate (spec.md §4.3):
    /// `overall >= threshold AND credibility_tier >= minimum_tier`.
    #[must_use]
    pub fn is_retained(&self, threshold: f32, minimum_tier: CredibilityTier) -> bool {
        self.quality.overall >= threshold && self.credibility_tier >= minimum_tier
    }
}
