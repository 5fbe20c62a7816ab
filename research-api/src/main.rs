//! Axum HTTP server exposing the single research endpoint (spec.md §6.1).

use clap::Parser;
use research_api::{build_router, Config};
use tracing_subscriber::EnvFilter;

/// Deep-research HTTP server.
#[derive(Parser, Debug)]
#[command(name = "research-api", version, about)]
struct Args {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = Config::from_env().map_err(|err| anyhow::anyhow!(err.to_string()))?;
    let router = build_router(&config);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    tracing::info!(addr = %args.listen, "research-api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
