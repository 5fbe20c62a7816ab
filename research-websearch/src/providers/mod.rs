//! Concrete [`research_core::SearchProvider`] implementations
//! (spec.md §4.1).

mod duckduckgo;
mod google_cse;
mod knowledge_fallback;
mod lm_grounded;
mod searchapi;

pub use duckduckgo::DuckDuckGo;
pub use google_cse::GoogleCustomSearch;
pub use knowledge_fallback::KnowledgeFallback;
pub use lm_grounded::LMGrounded;
pub use searchapi::SearchApi;
