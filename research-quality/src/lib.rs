//! URL canonicalization, domain classification, and quality scoring
//! (spec.md §4.3, component C3).
//!
//! `research-quality` turns a raw [`research_core::Hit`] into a scored,
//! classified [`research_core::Source`]. It performs no I/O and knows
//! nothing about providers or sessions.

mod canonicalize;
mod classify;
mod score;

pub use canonicalize::canonicalize;
pub use classify::classify;
pub use score::{score, OVERALL_WEIGHTS};

use chrono::Utc;
use research_core::{Hit, Source};

/// Turns a raw hit into a fully scored, classified [`Source`].
///
/// Returns `None` if `hit.url` cannot be canonicalized (spec.md §4.3:
/// "URLs that cannot be parsed are discarded").
#[must_use]
pub fn build_source(hit: &Hit, question: &str) -> Option<Source> {
    let canonical = canonicalize(&hit.url)?;
    let (domain_type, credibility_tier) = classify(&canonical);
    let quality = score::score(
        credibility_tier,
        domain_type,
        &hit.title,
        &hit.snippet,
        question,
        hit.published_at,
        Utc::now(),
    );
    Some(Source {
        url: canonical,
        title: hit.title.clone(),
        snippet: hit.snippet.clone(),
        domain_type,
        credibility_tier,
        quality,
        first_provider: hit.provider_name.clone(),
        label: None,
    })
}
