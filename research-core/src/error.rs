//! Error taxonomy for the research control plane (spec.md §7).
//!
//! Only two variants ever escape to a caller: [`ResearchError::RequestInvalid`]
//! (400) and [`ResearchError::Fatal`] (500/503). `ProviderFailure`,
//! `LMFailure`, and `DeadlineExceeded` are recovered locally by the
//! Dispatcher/Orchestrator and never surfaced — they exist here only so
//! the Orchestrator's diagnostics channel (spec.md §6.3) can report them
//! under a shared vocabulary.

use core::fmt;

/// Errors produced by the research control plane.
#[derive(Debug, Clone)]
pub enum ResearchError {
    /// The inbound request failed validation (spec.md §6.1). Surfaced as
    /// HTTP 400.
    RequestInvalid(String),
    /// Uncaught panic or missing required configuration at boot.
    /// Surfaced as HTTP 500/503.
    Fatal(String),
}

impl fmt::Display for ResearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestInvalid(msg) => write!(f, "invalid request: {msg}"),
            Self::Fatal(msg) => write!(f, "fatal error: {msg}"),
        }
    }
}

impl std::error::Error for ResearchError {}

impl From<anyhow::Error> for ResearchError {
    fn from(err: anyhow::Error) -> Self {
        Self::Fatal(err.to_string())
    }
}

/// Non-fatal provider failure kinds (spec.md §4.1/§7), recovered by the
/// Dispatcher and recorded on the diagnostics channel rather than
/// propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailureKind {
    /// Required credentials/configuration were missing.
    AuthMissing,
    /// The backend reported rate limiting.
    RateLimited,
    /// The backend returned a 5xx-equivalent failure.
    Upstream5xx,
    /// The call did not complete in time.
    Timeout,
    /// The response could not be parsed.
    Malformed,
    /// The call succeeded but returned no hits.
    Empty,
}

impl fmt::Display for ProviderFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AuthMissing => "auth_missing",
            Self::RateLimited => "rate_limited",
            Self::Upstream5xx => "upstream_5xx",
            Self::Timeout => "timeout",
            Self::Malformed => "malformed",
            Self::Empty => "empty",
        };
        f.write_str(label)
    }
}
