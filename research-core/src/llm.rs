//! Provider-agnostic language-model trait used by the LM-backed
//! components (Planner, Reflector, Finalizer, and the `LMGrounded`
//! search provider).
//!
//! The concrete prompts shipped to the model are out of scope for this
//! crate (spec.md §1) — only the shape of the request/response is
//! specified here. A production binary wires a real provider crate
//! (OpenAI, Claude, Gemini, ...) behind this trait.

use core::future::Future;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// A single-turn request: a system instruction plus the user content.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// System/instruction prompt.
    pub system: String,
    /// User-turn content.
    pub user: String,
    /// Optional sampling temperature.
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// Overrides the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Builds a single-turn request from a system instruction and user text.
#[must_use]
pub fn oneshot(system: impl Into<String>, user: impl Into<String>) -> LlmRequest {
    LlmRequest {
        system: system.into(),
        user: user.into(),
        temperature: None,
    }
}

/// Language models usable by the research control plane.
///
/// Mirrors the shape of `aither_core::LanguageModel::generate`: callers
/// ask for a concrete, `JsonSchema`-describable type and the
/// implementation is responsible for getting the provider to emit
/// conforming JSON (via native structured output or a schema-in-prompt
/// fallback).
pub trait LanguageModel: Send + Sync {
    /// Error type returned by this model.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Generates structured output conforming to `T`'s JSON schema.
    fn generate<T>(&self, request: LlmRequest) -> impl Future<Output = Result<T, Self::Error>> + Send
    where
        T: DeserializeOwned + JsonSchema + Send + 'static;

    /// Generates free-form text (used by the Finalizer for the final
    /// answer body, which is prose with inline `[k]` markers rather
    /// than a schema-conforming object).
    fn generate_text(
        &self,
        request: LlmRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
