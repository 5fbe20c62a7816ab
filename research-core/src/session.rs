//! [`Session`]: the mutable state machine at the heart of one research
//! request (spec.md §3, §4.6).

use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::model::{CredibilityTier, Query};
use crate::model::Source;

/// Lifecycle phase of a [`Session`] (spec.md §3, state machine in §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Obtaining queries from the Planner.
    Planning,
    /// Fanning queries out through the Dispatcher and merging sources.
    Searching,
    /// Asking the Reflector whether evidence is sufficient.
    Reflecting,
    /// Handing retained sources to the Finalizer.
    Finalizing,
    /// Terminal success state.
    Done,
    /// Terminal failure state (boot-time Fatal only; see spec.md §7).
    Failed,
}

/// Effective configuration for one session (spec.md §6.2), resolved once
/// from process configuration plus the per-request overrides of
/// spec.md §6.1 and then treated as immutable for the session's life.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on Planner's initial query batch (1..10).
    pub initial_query_count: u8,
    /// Upper bound on Planner's follow-up query batch.
    pub followup_query_count: u8,
    /// Maximum number of Planning→Searching→Reflecting loops (1..10).
    pub max_loops: u8,
    /// Minimum `overall` score for a source to be retained.
    pub quality_threshold: f32,
    /// Minimum credibility tier for a source to be retained.
    pub minimum_tier: CredibilityTier,
    /// Whether the request asked for `filtered_sources`/`quality_summary`.
    pub enhanced_filtering: bool,
    /// Reasoning model token forwarded to the LM layer.
    pub reasoning_model: String,
    /// Wall-clock budget for the whole session.
    pub session_deadline: Duration,
    /// Per-provider call timeout.
    pub per_provider_timeout: Duration,
    /// Per-provider retry count for transient network errors.
    pub per_provider_retries: u8,
    /// Per-provider in-flight call bound.
    pub provider_concurrency: usize,
    /// Bound on concurrent query fan-out within a Searching phase.
    pub parallel_searches: usize,
    /// Cap on total sources retained in a session.
    pub max_sources_total: usize,
    /// Hits requested per query per provider call (spec.md §4.2 step 2).
    pub per_query_limit: usize,
    /// Hard cap on concurrent HTTP connections across all providers.
    pub http_max_connections: usize,
}

impl SessionConfig {
    /// Sensible process-level defaults (spec.md §6.2), with `parallel_searches`
    /// resolved from the host's CPU count as the spec's `max(4, 2×CPU)`,
    /// capped at 16.
    #[must_use]
    pub fn defaults() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(2);
        Self {
            initial_query_count: 3,
            followup_query_count: 2,
            max_loops: 2,
            quality_threshold: 0.6,
            minimum_tier: CredibilityTier::Low,
            enhanced_filtering: false,
            reasoning_model: String::from("default"),
            session_deadline: Duration::from_secs(120),
            per_provider_timeout: Duration::from_secs(10),
            per_provider_retries: 2,
            provider_concurrency: 4,
            parallel_searches: (2 * cpus).max(4).min(16),
            max_sources_total: 50,
            per_query_limit: 10,
            http_max_connections: 64,
        }
    }
}

/// Best-effort progress events (spec.md §6.3). Emitted through
/// `tracing` by the Orchestrator; carries no source content until
/// `Finalizing` is reached.
#[derive(Debug, Clone)]
pub enum DiagnosticEvent {
    /// Phase transition.
    PhaseChanged { phase: Phase },
    /// Planner produced `count` new queries.
    QueriesGenerated { count: usize },
    /// `count` new sources were merged this Searching phase.
    SourcesMerged { count: usize },
    /// A loop finished; `loop_index` is the loop that just completed.
    LoopComplete { loop_index: u32 },
    /// Orchestrator is handing off to the Finalizer.
    Finalizing,
    /// A provider call failed non-fatally.
    ProviderFailed { provider: String, status: String },
}

/// One self-contained research request's mutable state.
///
/// Mutated only by the Orchestrator: every provider/LM call returns a
/// value, the Orchestrator merges it in serially, so no locking is
/// required (spec.md §5).
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque identifier, unique per request.
    pub id: String,
    /// Original user question, immutable after creation.
    pub question: String,
    /// Effective configuration snapshot.
    pub config: SessionConfig,
    /// Incremented after each reflection.
    pub loop_index: u32,
    /// Normalized-key -> Query, insertion order preserved. The key
    /// uniqueness is what enforces invariant 3 (no duplicate queries
    /// under normalization, spec.md §3).
    queries_executed: IndexMap<String, Query>,
    /// Canonical URL -> Source, insertion order preserved (determines
    /// citation labels, spec.md §5).
    sources: IndexMap<String, Source>,
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Absolute instant after which further work must short-circuit to
    /// Finalizing.
    pub deadline: Instant,
}

impl Session {
    /// Creates a new session at `Planning` with a fresh deadline derived
    /// from `config.session_deadline`.
    #[must_use]
    pub fn new(id: impl Into<String>, question: impl Into<String>, config: SessionConfig) -> Self {
        let deadline = Instant::now() + config.session_deadline;
        Self {
            id: id.into(),
            question: question.into(),
            config,
            loop_index: 0,
            queries_executed: IndexMap::new(),
            sources: IndexMap::new(),
            phase: Phase::Planning,
            deadline,
        }
    }

    /// Whether the session's wall-clock deadline has passed.
    #[must_use]
    pub fn deadline_exceeded(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Time remaining until the deadline (zero if already past).
    #[must_use]
    pub fn time_remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Registers a query as executed, returning `false` if an
    /// equal-under-normalization query was already recorded (spec.md
    /// §3 invariant 3, §8 P7).
    pub fn record_query(&mut self, query: Query) -> bool {
        let key = query.normalized_key();
        if self.queries_executed.contains_key(&key) {
            return false;
        }
        self.queries_executed.insert(key, query);
        true
    }

    /// All queries executed so far, in the order they were first recorded.
    #[must_use]
    pub fn queries_executed(&self) -> impl Iterator<Item = &Query> {
        self.queries_executed.values()
    }

    /// Number of unique queries executed so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries_executed.len()
    }

    /// Merges a scored/classified source, keyed by its canonical URL.
    ///
    /// First-write-wins on collision: if a source with the same
    /// canonical URL already exists, it — and its recorded
    /// `first_provider` — is left untouched (spec.md §4.6 step 2).
    /// Returns `true` if this was a new source.
    pub fn merge_source(&mut self, source: Source) -> bool {
        if self.sources.contains_key(&source.url) {
            return false;
        }
        self.sources.insert(source.url.clone(), source);
        true
    }

    /// All sources in insertion order (spec.md §5 ordering guarantee).
    #[must_use]
    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    /// Number of sources currently held (retained + filtered).
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Drops the lowest-`overall` sources until at most
    /// `config.max_sources_total` remain (spec.md §4.6 budgets),
    /// preserving relative insertion order among survivors.
    pub fn enforce_source_budget(&mut self) {
        let cap = self.config.max_sources_total;
        if self.sources.len() <= cap {
            return;
        }
        let mut ranked: Vec<(String, f32)> = self
            .sources
            .iter()
            .map(|(url, source)| (url.clone(), source.quality.overall))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        let drop_count = self.sources.len() - cap;
        for (url, _) in ranked.into_iter().take(drop_count) {
            self.sources.shift_remove(&url);
        }
    }

    /// Mutable access to a source by canonical URL, for assigning
    /// citation labels during Finalizing.
    pub fn source_mut(&mut self, canonical_url: &str) -> Option<&mut Source> {
        self.sources.get_mut(canonical_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QueryOrigin;

    fn config() -> SessionConfig {
        SessionConfig::defaults()
    }

    #[test]
    fn record_query_rejects_normalized_duplicates() {
        let mut session = Session::new("s1", "q", config());
        assert!(session.record_query(Query::new("Rust Async", QueryOrigin::Initial, 0)));
        assert!(!session.record_query(Query::new("rust   async", QueryOrigin::Initial, 0)));
        assert_eq!(session.query_count(), 1);
    }

    #[test]
    fn merge_source_is_first_write_wins() {
        let mut session = Session::new("s1", "q", config());
        let first = sample_source("https://example.com/a", "first");
        let second = sample_source("https://example.com/a", "second");
        assert!(session.merge_source(first));
        assert!(!session.merge_source(second));
        let stored = session.sources().next().unwrap();
        assert_eq!(stored.first_provider, "first");
    }

    #[test]
    fn enforce_source_budget_drops_lowest_overall_first() {
        let mut session = Session::new("s1", "q", config());
        session.config.max_sources_total = 1;
        let mut low = sample_source("https://example.com/low", "p");
        low.quality.overall = 0.1;
        let mut high = sample_source("https://example.com/high", "p");
        high.quality.overall = 0.9;
        session.merge_source(low);
        session.merge_source(high);
        session.enforce_source_budget();
        let remaining: Vec<_> = session.sources().map(|s| s.url.clone()).collect();
        assert_eq!(remaining, vec!["https://example.com/high".to_string()]);
    }

    fn sample_source(url: &str, provider: &str) -> Source {
        use crate::model::{DomainType, Quality};
        Source {
            url: url.to_string(),
            title: "t".into(),
            snippet: "s".into(),
            domain_type: DomainType::Commercial,
            credibility_tier: CredibilityTier::Medium,
            quality: Quality {
                credibility: 0.7,
                relevance: 0.5,
                completeness: 0.5,
                recency: 0.5,
                authority: 0.7,
                overall: 0.6,
            },
            first_provider: provider.to_string(),
            label: None,
        }
    }
}
