//! Environment configuration, a chat-completions-backed language
//! model, and the HTTP surface for the deep-research control plane
//! (spec.md §6).

mod chat_model;
mod config;
mod server;
mod wire;

pub use chat_model::{ChatModel, ChatModelError};
pub use config::Config;
pub use server::build_router;
pub use wire::{QualityBreakdown, QualitySummary, ResearchRequest, ResearchResponse, SourceQualityFilter, WireSource};
