//! Worldforge API server entry point.

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use worldforge_core::clock::{Clock, SystemClock};
use worldforge_generation::application::client::GenerationClient;
use worldforge_generation::application::executor::CallExecutor;
use worldforge_generation::application::recorder::CallRecorder;
use worldforge_providers::{OpenAiImageGenerator, OpenAiTextGenerator};
use worldforge_store::InMemoryStore;
use worldforge_tasks::application::queue::TaskQueue;
use worldforge_worldgen::application::orchestrator::WorldGenerator;

use worldforge_api::config::AppConfig;
use worldforge_api::error::AppError;
use worldforge_api::routes;
use worldforge_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Worldforge API server");

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr()?;

    // Wire the generation stack.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(InMemoryStore::new());
    let client = GenerationClient::new(
        Arc::new(OpenAiTextGenerator::new(config.provider.clone())?),
        Arc::new(OpenAiImageGenerator::new(config.provider.clone())?),
        CallExecutor::new(CallRecorder::new(store.clone(), clock.clone())),
        config.generation.clone(),
    );
    let generator = WorldGenerator::new(client, store.clone(), clock.clone());
    let app_state = AppState::new(TaskQueue::new(clock), generator, store, config.task_retention);

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!(%addr, text_model = %config.generation.text_model.model, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
