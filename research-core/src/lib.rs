//! Core data model and trait abstractions for the deep-research control plane.
//!
//! `research-core` hosts the types shared by every other crate in the
//! workspace: the [`Session`] state machine's data, the `Query`/`Hit`/
//! `Source` value types, the [`SearchProvider`] contract search backends
//! implement, and the [`LanguageModel`] trait the LM-backed components
//! (Planner, Reflector, Finalizer) are generic over.
//!
//! Nothing in this crate performs I/O. Providers, the dispatcher, the
//! quality scorer, and the orchestrator all live in sibling crates and
//! depend on these types rather than the other way around.

mod error;
mod llm;
mod model;
mod provider;
mod session;

pub use error::{ProviderFailureKind, ResearchError};
pub use llm::{LanguageModel, LlmRequest, oneshot};
pub use model::{CredibilityTier, DomainType, Hit, Quality, Query, QueryOrigin, Source};
pub use provider::{ProviderStatus, SearchProvider};
pub use session::{DiagnosticEvent, Phase, Session, SessionConfig};

/// Result alias used throughout the workspace for recoverable operations.
pub type Result<T = String> = anyhow::Result<T>;
