//! Minimal axum HTTP surface exposing the single endpoint from
//! spec.md §6.1.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use research_agent::{DefaultFinalizer, DefaultPlanner, DefaultReflector, Orchestrator};
use research_core::{Session, SessionConfig};
use research_websearch::{default_chain, DuckDuckGo, GoogleCustomSearch, KnowledgeFallback, LMGrounded, SearchApi};
use uuid::Uuid;

use crate::chat_model::ChatModel;
use crate::config::Config;
use crate::wire::{ResearchRequest, ResearchResponse};

type ResearchOrchestrator = Orchestrator<DefaultPlanner<ChatModel>, DefaultReflector<ChatModel>, DefaultFinalizer<ChatModel>>;

/// Shared application state: one orchestrator, built once at startup
/// from whichever providers the environment configured.
struct AppState {
    orchestrator: ResearchOrchestrator,
    session_defaults: SessionConfig,
    default_quality_threshold: f32,
}

/// Builds the router for the research endpoint.
///
/// `config.lm_api_key` has already been validated non-empty by
/// [`Config::from_env`]; construction here cannot fail.
#[must_use]
pub fn build_router(config: &Config) -> Router {
    let model = ChatModel::new(config.lm_api_key.clone(), config.lm_default_model.clone());

    let max_retries = config.session_defaults.per_provider_retries;
    let dispatcher = default_chain(
        LMGrounded::new(model.clone()),
        GoogleCustomSearch::new(config.google_api_key.clone().unwrap_or_default(), config.google_cse_id.clone().unwrap_or_default())
            .with_max_retries(max_retries),
        SearchApi::new(config.searchapi_key.clone().unwrap_or_default()).with_max_retries(max_retries),
        DuckDuckGo::new().with_max_retries(max_retries),
        KnowledgeFallback::new(),
        config.session_defaults.provider_concurrency,
        config.session_defaults.per_provider_timeout,
    );

    let orchestrator = Orchestrator::new(
        DefaultPlanner::new(model.clone()),
        DefaultReflector::new(model.clone()),
        DefaultFinalizer::new(model),
        Arc::new(dispatcher),
    );

    let state = Arc::new(AppState {
        orchestrator,
        default_quality_threshold: config.session_defaults.quality_threshold,
        session_defaults: config.session_defaults.clone(),
    });

    Router::new().route("/v1/research", post(handle_research)).with_state(state)
}

async fn handle_research(State(state): State<Arc<AppState>>, Json(request): Json<ResearchRequest>) -> Response {
    if let Err(reason) = request.validate() {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": reason }))).into_response();
    }

    let mut session_config = state.session_defaults.clone();
    session_config.initial_query_count = request.initial_search_query_count;
    session_config.max_loops = request.max_research_loops;
    session_config.minimum_tier = request.source_quality_filter.minimum_tier();
    if request.enhanced_filtering {
        session_config.quality_threshold = request.quality_threshold;
    }
    if let Some(reasoning_model) = &request.reasoning_model {
        session_config.reasoning_model = reasoning_model.clone();
    }

    let mut session = Session::new(Uuid::new_v4().to_string(), request.question.clone(), session_config);
    let result = state.orchestrator.run(&mut session).await;

    let response = ResearchResponse::from_result(&result, &request, state.default_quality_threshold);
    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_orchestrator_type_alias_resolves() {
        fn assert_send<T: Send>() {}
        assert_send::<ResearchOrchestrator>();
    }
}
