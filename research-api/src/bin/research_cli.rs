//! Small demo binary: reads a question from stdin, runs one research
//! session against whichever providers the environment configures, and
//! prints the JSON response to stdout.
//!
//! ```bash
//! echo "who won euro 2024?" | RESEARCH_LM_API_KEY=sk-... cargo run -p research-api --bin research-cli
//! ```

use std::io::{self, Read};
use std::sync::Arc;

use clap::Parser;
use research_agent::{DefaultFinalizer, DefaultPlanner, DefaultReflector, Orchestrator};
use research_api::{ChatModel, Config, ResearchRequest, ResearchResponse};
use research_core::Session;
use research_websearch::{default_chain, DuckDuckGo, GoogleCustomSearch, KnowledgeFallback, LMGrounded, SearchApi};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// One-shot research session driven from stdin.
#[derive(Parser, Debug)]
#[command(name = "research-cli", version, about)]
struct Args {
    /// Maximum Planning/Searching/Reflecting loops.
    #[arg(long, default_value_t = 2)]
    max_loops: u8,
    /// Include `filtered_sources`/`quality_summary` in the output.
    #[arg(long)]
    enhanced_filtering: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = Config::from_env().map_err(|err| anyhow::anyhow!(err.to_string()))?;

    let mut question = String::new();
    io::stdin().read_to_string(&mut question)?;
    let question = question.trim().to_string();
    anyhow::ensure!(!question.is_empty(), "no question provided on stdin");

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

    let mut session_config = config.session_defaults.clone();
    session_config.max_loops = args.max_loops;

    let request = ResearchRequest {
        question: question.clone(),
        initial_search_query_count: session_config.initial_query_count,
        max_research_loops: args.max_loops,
        reasoning_model: None,
        source_quality_filter: research_api::SourceQualityFilter::Any,
        enhanced_filtering: args.enhanced_filtering,
        quality_threshold: session_config.quality_threshold,
    };

    let mut session = Session::new(Uuid::new_v4().to_string(), question, session_config.clone());
    let result = orchestrator.run(&mut session).await;
    let response = ResearchResponse::from_result(&result, &request, session_config.quality_threshold);

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
