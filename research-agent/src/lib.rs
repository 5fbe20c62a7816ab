//! Planner, Reflector, Finalizer, and the session state machine that
//! ties them together with the dispatcher from `research-websearch`.
//!
//! This crate hosts components C4-C7 of the deep-research control
//! plane: the LM-backed roles are generic over [`research_core::LanguageModel`]
//! so a caller can supply any concrete provider (OpenAI, Claude,
//! Gemini, ...) behind it, and [`Orchestrator`] drives them through
//! the loop described by `research_core::Session`.

mod finalizer;
mod orchestrator;
mod planner;
mod reflector;

pub use finalizer::{DefaultFinalizer, FinalAnswer, Finalizer};
pub use orchestrator::{Orchestrator, OrchestratorResult};
pub use planner::{DefaultPlanner, FollowUpContext, Planner};
pub use reflector::{DefaultReflector, Reflection, Reflector};
