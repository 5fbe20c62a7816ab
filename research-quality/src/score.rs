//! Multi-factor quality scoring (spec.md §4.3).

use chrono::{DateTime, Utc};
use research_core::{CredibilityTier, DomainType, Quality};

/// Weights applied to (credibility, relevance, completeness, recency,
/// authority) to produce `overall`. Named so tests can recompute the
/// exact expected value rather than hardcoding it twice.
pub const OVERALL_WEIGHTS: [f32; 5] = [0.30, 0.30, 0.15, 0.15, 0.10];

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is",
    "it", "its", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with", "what",
    "which", "who", "why", "how", "does", "do", "did",
];

/// Computes the five sub-scores and the weighted `overall` for a hit
/// (spec.md §4.3).
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn score(
    credibility_tier: CredibilityTier,
    domain_type: DomainType,
    title: &str,
    snippet: &str,
    question: &str,
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Quality {
    let credibility = credibility_tier.credibility_weight();
    let relevance = relevance_score(title, snippet, question);
    let completeness = completeness_score(snippet);
    let recency = recency_score(published_at, now);
    let authority = authority_score(credibility, domain_type);

    let overall = OVERALL_WEIGHTS[0] * credibility
        + OVERALL_WEIGHTS[1] * relevance
        + OVERALL_WEIGHTS[2] * completeness
        + OVERALL_WEIGHTS[3] * recency
        + OVERALL_WEIGHTS[4] * authority;

    Quality {
        credibility,
        relevance,
        completeness,
        recency,
        authority,
        overall: overall.clamp(0.0, 1.0),
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty() && !STOP_WORDS.contains(token))
        .map(str::to_owned)
        .collect()
}

fn relevance_score(title: &str, snippet: &str, question: &str) -> f32 {
    let question_tokens = tokenize(question);
    if question_tokens.is_empty() {
        return 0.0;
    }
    let body = format!("{title} {snippet}");
    let body_tokens: std::collections::HashSet<String> = tokenize(&body).into_iter().collect();
    let overlap = question_tokens
        .iter()
        .filter(|token| body_tokens.contains(*token))
        .count();
    (overlap as f32 / question_tokens.len() as f32).clamp(0.0, 1.0)
}

fn completeness_score(snippet: &str) -> f32 {
    let len = snippet.chars().count() as f32;
    const FLOOR: f32 = 40.0;
    const CEIL: f32 = 400.0;
    if len <= FLOOR {
        0.0
    } else if len >= CEIL {
        1.0
    } else {
        (len - FLOOR) / (CEIL - FLOOR)
    }
}

fn recency_score(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f32 {
    let Some(published_at) = published_at else {
        return 0.5;
    };
    let age_days = (now - published_at).num_days();
    if age_days < 0 {
        1.0
    } else if age_days <= 30 {
        1.0
    } else if age_days <= 90 {
        0.9
    } else if age_days <= 365 {
        0.75
    } else if age_days <= 365 * 3 {
        0.5
    } else {
        0.25
    }
}

fn authority_score(credibility: f32, domain_type: DomainType) -> f32 {
    let bonus = if matches!(domain_type, DomainType::Academic | DomainType::Official) {
        0.1
    } else {
        0.0
    };
    (credibility + bonus).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn completeness_rises_linearly_between_bounds() {
        assert_eq!(completeness_score(&"a".repeat(40)), 0.0);
        assert_eq!(completeness_score(&"a".repeat(400)), 1.0);
        let mid = completeness_score(&"a".repeat(220));
        assert!((mid - 0.5).abs() < 0.01);
    }

    #[test]
    fn recency_buckets_match_spec() {
        let now = Utc::now();
        assert_eq!(recency_score(Some(now - Duration::days(10)), now), 1.0);
        assert_eq!(recency_score(Some(now - Duration::days(60)), now), 0.9);
        assert_eq!(recency_score(Some(now - Duration::days(200)), now), 0.75);
        assert_eq!(recency_score(Some(now - Duration::days(800)), now), 0.5);
        assert_eq!(recency_score(Some(now - Duration::days(2000)), now), 0.25);
        assert_eq!(recency_score(None, now), 0.5);
    }

    #[test]
    fn authority_adds_bonus_only_for_academic_and_official() {
        assert_eq!(authority_score(0.7, DomainType::Academic), 0.8);
        assert_eq!(authority_score(0.7, DomainType::Official), 0.8);
        assert_eq!(authority_score(0.7, DomainType::Commercial), 0.7);
        assert_eq!(authority_score(1.0, DomainType::Academic), 1.0);
    }

    #[test]
    fn relevance_counts_question_token_overlap() {
        let score = relevance_score(
            "Rust async runtimes",
            "A comparison of tokio and async-std",
            "what are the best rust async runtimes",
        );
        assert!(score > 0.5);
    }

    #[test]
    fn overall_matches_hand_computed_weighted_mean() {
        let quality = score(
            CredibilityTier::High,
            DomainType::Academic,
            "Rust async runtimes",
            &"a".repeat(400),
            "rust async runtimes",
            None,
            Utc::now(),
        );
        let expected = OVERALL_WEIGHTS[0] * quality.credibility
            + OVERALL_WEIGHTS[1] * quality.relevance
            + OVERALL_WEIGHTS[2] * quality.completeness
            + OVERALL_WEIGHTS[3] * quality.recency
            + OVERALL_WEIGHTS[4] * quality.authority;
        assert!((quality.overall - expected).abs() < 1e-6);
    }
}
