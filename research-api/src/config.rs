//! Process-level configuration, loaded once at startup from the
//! environment (spec.md §6.2).

use std::time::Duration;

use research_core::{CredibilityTier, ResearchError, SessionConfig};

/// Resolved process configuration. Stable contract names (env var
/// prefix `RESEARCH_`) mirror spec.md §6.2's table.
#[derive(Debug, Clone)]
pub struct Config {
    /// Drives Planner/Reflector/Finalizer and the `LMGrounded` provider.
    pub lm_api_key: String,
    /// Default `reasoning_model` when a request doesn't override it.
    pub lm_default_model: String,
    /// Google Programmable Search Engine id, if configured.
    pub google_cse_id: Option<String>,
    /// Google Custom Search API key, if configured.
    pub google_api_key: Option<String>,
    /// SearchApi.io-style API key, if configured.
    pub searchapi_key: Option<String>,
    /// Per-session defaults handed to every [`SessionConfig`] built
    /// from a request.
    pub session_defaults: SessionConfig,
}

impl Config {
    /// Loads configuration from the process environment, reading a
    /// `.env` file first if present (mirrors the `dotenvy` idiom used
    /// elsewhere in the pack for LLM-backed services).
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Fatal`] if `RESEARCH_LM_API_KEY` is
    /// unset or empty — every LM-backed role requires it.
    pub fn from_env() -> Result<Self, ResearchError> {
        let _ = dotenvy::dotenv();

        let lm_api_key = env_string("RESEARCH_LM_API_KEY").filter(|key| !key.is_empty()).ok_or_else(|| {
            ResearchError::Fatal("RESEARCH_LM_API_KEY is required but was not set".into())
        })?;

        let mut session_defaults = SessionConfig::defaults();
        if let Some(value) = env_u8("RESEARCH_INITIAL_QUERY_COUNT_DEFAULT") {
            session_defaults.initial_query_count = value;
        }
        if let Some(value) = env_u8("RESEARCH_FOLLOWUP_QUERY_COUNT") {
            session_defaults.followup_query_count = value;
        }
        if let Some(value) = env_u8("RESEARCH_MAX_LOOPS_DEFAULT") {
            session_defaults.max_loops = value;
        }
        if let Some(value) = env_f32("RESEARCH_QUALITY_THRESHOLD_DEFAULT") {
            session_defaults.quality_threshold = value;
        }
        if let Some(value) = env_duration_secs("RESEARCH_SESSION_DEADLINE") {
            session_defaults.session_deadline = value;
        }
        if let Some(value) = env_duration_secs("RESEARCH_PER_PROVIDER_TIMEOUT") {
            session_defaults.per_provider_timeout = value;
        }
        if let Some(value) = env_u8("RESEARCH_PER_PROVIDER_RETRIES") {
            session_defaults.per_provider_retries = value;
        }
        if let Some(value) = env_usize("RESEARCH_PROVIDER_CONCURRENCY") {
            session_defaults.provider_concurrency = value;
        }
        if let Some(value) = env_usize("RESEARCH_PARALLEL_SEARCHES") {
            session_defaults.parallel_searches = value;
        }
        if let Some(value) = env_usize("RESEARCH_MAX_SOURCES_TOTAL") {
            session_defaults.max_sources_total = value;
        }
        if let Some(value) = env_usize("RESEARCH_HTTP_MAX_CONNECTIONS") {
            session_defaults.http_max_connections = value;
        }
        session_defaults.minimum_tier = CredibilityTier::Low;

        Ok(Self {
            lm_api_key,
            lm_default_model: env_string("RESEARCH_LM_DEFAULT_MODEL").unwrap_or_else(|| "default".to_string()),
            google_cse_id: env_string("RESEARCH_GOOGLE_CSE_ID"),
            google_api_key: env_string("RESEARCH_GOOGLE_API_KEY"),
            searchapi_key: env_string("RESEARCH_SEARCHAPI_KEY"),
            session_defaults,
        })
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_u8(key: &str) -> Option<u8> {
    env_string(key).and_then(|value| value.parse().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_string(key).and_then(|value| value.parse().ok())
}

fn env_f32(key: &str) -> Option<f32> {
    env_string(key).and_then(|value| value.parse().ok())
}

fn env_duration_secs(key: &str) -> Option<Duration> {
    env_string(key).and_then(|value| value.parse().ok()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_u8_returns_none_for_unset_keys() {
        assert_eq!(env_u8("RESEARCH_TEST_DOES_NOT_EXIST"), None);
    }
}
