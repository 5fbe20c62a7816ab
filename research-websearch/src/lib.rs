//! Search provider implementations and fallback dispatcher for the
//! deep-research control plane (spec.md §4.1/§4.2, components C1/C2).
//!
//! Every provider implements [`research_core::SearchProvider`] and
//! never lets a network or parse error escape as a panic or an
//! `Err` — failures are reported through [`research_core::ProviderStatus`]
//! instead, so the [`Dispatcher`] can fall through to the next backend.

mod dispatcher;
mod providers;
mod retry;

pub use dispatcher::{default_chain, DispatchOutcome, Dispatcher, ProviderAttempt};
pub use providers::{
    DuckDuckGo, GoogleCustomSearch, KnowledgeFallback, LMGrounded, SearchApi,
};
