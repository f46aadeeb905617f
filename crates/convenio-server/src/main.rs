mod api;
mod state;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use convenio_core::{Config, Database};
use state::AppState;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "convenio-server", about = "HTTP API for the convenio assistant")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "CONVENIO_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    /// SQLite database path (defaults to the platform data directory)
    #[arg(long, env = "CONVENIO_DB")]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load()?;

    let db_path = args.db.unwrap_or_else(Database::default_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!("Database: {}", db_path.display());
    tracing::info!(
        "LLM service: {} ({})",
        config.llm_service.chat_url(),
        config.llm_service.model
    );
    if !config.llm_service.is_configured() {
        tracing::warn!("no LLM endpoint or API key configured; answers will degrade");
    }

    let state = AppState::new(config, &db_path)?;

    let app = Router::new()
        .route("/search", get(api::search::search))
        .route("/chat", post(api::chat::chat))
        .route("/calculate", post(api::calculate::calculate))
        .route("/calculate-simple", post(api::calculate::calculate_simple))
        .route("/companies", get(api::meta::companies))
        .route("/companies/{slug}/groups", get(api::meta::groups))
        .route("/companies/{slug}/levels", get(api::meta::levels))
        .route("/companies/{slug}/concepts", get(api::meta::concepts))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!("Server listening on {}", args.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
