//! Domain classification into [`DomainType`]/[`CredibilityTier`] pairs
//! (spec.md §4.3).

use research_core::{CredibilityTier, DomainType};
use url::Url;

/// Explicit academic allowlist beyond the `.edu`/`.ac.*` suffix rule.
const ACADEMIC_ALLOWLIST: &[&str] = &["arxiv.org", "pubmed.ncbi.nlm.nih.gov", "nature.com", "science.org"];

/// Intergovernmental-organization allowlist, treated like `.gov`/`.mil`.
const OFFICIAL_ALLOWLIST: &[&str] = &["europa.eu", "who.int", "un.org", "worldbank.org", "imf.org"];

/// High-credibility news allowlist.
const NEWS_HIGH_ALLOWLIST: &[&str] = &[
    "reuters.com",
    "apnews.com",
    "bbc.com",
    "bbc.co.uk",
    "npr.org",
    "afp.com",
];

/// Broader publisher list scored `News/Medium`.
const NEWS_MEDIUM_ALLOWLIST: &[&str] = &[
    "nytimes.com",
    "washingtonpost.com",
    "theguardian.com",
    "wsj.com",
    "bloomberg.com",
    "cnn.com",
    "economist.com",
];

/// Encyclopedic reference sources.
const REFERENCE_ALLOWLIST: &[&str] = &["wikipedia.org", "britannica.com"];

/// Domains upgraded from `Commercial/Low` to `Commercial/Medium`.
const REPUTABLE_COMMERCIAL_ALLOWLIST: &[&str] = &[
    "github.com",
    "stackoverflow.com",
    "techcrunch.com",
    "wired.com",
];

/// Classifies a canonical URL into its domain type and credibility tier
/// (spec.md §4.3). Falls back to `Commercial/Low` for anything
/// unrecognized, and to `Other/Low` if the host cannot even be parsed.
#[must_use]
pub fn classify(canonical_url: &str) -> (DomainType, CredibilityTier) {
    let Some(host) = Url::parse(canonical_url).ok().and_then(|u| u.host_str().map(str::to_owned)) else {
        return (DomainType::Other, CredibilityTier::Low);
    };

    if host.ends_with(".edu") || is_ac_suffix(&host) || matches_suffix(&host, ACADEMIC_ALLOWLIST) {
        return (DomainType::Academic, CredibilityTier::High);
    }

    if host.ends_with(".gov") || host.ends_with(".mil") || matches_suffix(&host, OFFICIAL_ALLOWLIST) {
        return (DomainType::Official, CredibilityTier::High);
    }

    if matches_suffix(&host, NEWS_HIGH_ALLOWLIST) {
        return (DomainType::News, CredibilityTier::High);
    }

    if matches_suffix(&host, NEWS_MEDIUM_ALLOWLIST) || looks_like_news_domain(&host) {
        return (DomainType::News, CredibilityTier::Medium);
    }

    if matches_suffix(&host, REFERENCE_ALLOWLIST) {
        return (DomainType::Reference, CredibilityTier::Medium);
    }

    if matches_suffix(&host, REPUTABLE_COMMERCIAL_ALLOWLIST) {
        return (DomainType::Commercial, CredibilityTier::Medium);
    }

    (DomainType::Commercial, CredibilityTier::Low)
}

/// `.ac.uk`, `.ac.jp`, etc — any second-level `ac.` suffix.
fn is_ac_suffix(host: &str) -> bool {
    host.rsplit('.').nth(1).is_some_and(|label| label == "ac")
}

fn matches_suffix(host: &str, allowlist: &[&str]) -> bool {
    allowlist
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}

/// A cheap heuristic for news sites we have no explicit entry for:
/// hosts under a `news.` subdomain, or ending in common news-adjacent
/// TLDs used by the broader publisher ecosystem.
fn looks_like_news_domain(host: &str) -> bool {
    host.starts_with("news.") || host.ends_with(".news")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edu_and_allowlisted_academic_hosts() {
        assert_eq!(
            classify("https://mit.edu/research"),
            (DomainType::Academic, CredibilityTier::High)
        );
        assert_eq!(
            classify("https://arxiv.org/abs/1234"),
            (DomainType::Academic, CredibilityTier::High)
        );
        assert_eq!(
            classify("https://www.ox.ac.uk/page"),
            (DomainType::Academic, CredibilityTier::High)
        );
    }

    #[test]
    fn gov_and_igo_hosts_are_official() {
        assert_eq!(
            classify("https://nasa.gov/mission"),
            (DomainType::Official, CredibilityTier::High)
        );
        assert_eq!(
            classify("https://www.who.int/news"),
            (DomainType::Official, CredibilityTier::High)
        );
    }

    #[test]
    fn news_allowlists_split_high_and_medium() {
        assert_eq!(
            classify("https://www.reuters.com/world"),
            (DomainType::News, CredibilityTier::High)
        );
        assert_eq!(
            classify("https://www.nytimes.com/section"),
            (DomainType::News, CredibilityTier::Medium)
        );
    }

    #[test]
    fn wikipedia_is_reference_medium() {
        assert_eq!(
            classify("https://en.wikipedia.org/wiki/Rust"),
            (DomainType::Reference, CredibilityTier::Medium)
        );
    }

    #[test]
    fn unknown_commercial_host_defaults_low() {
        assert_eq!(
            classify("https://some-random-blog.example"),
            (DomainType::Commercial, CredibilityTier::Low)
        );
        assert_eq!(
            classify("https://github.com/rust-lang/rust"),
            (DomainType::Commercial, CredibilityTier::Medium)
        );
    }
}
