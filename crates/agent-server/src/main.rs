//! Support agent HTTP Server
//!
//! Axum-based server exposing the support agent over a small REST API.
//! Conversations are keyed by `thread_id` and kept in memory, or on disk
//! when `SESSION_DIR` is set.

mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{
    AgentBuilder, AgentConfig, FileSessionStore, LlmProvider, MemorySessionStore, SessionStore,
};
use agent_runtime::OllamaProvider;
use support_desk::SUPPORT_AGENT_PROMPT;

use crate::routes::router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize LLM provider
    let provider: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::from_env());

    // Verify Ollama connection
    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to Ollama");
            if let Ok(models) = provider.list_models().await {
                for model in models {
                    tracing::info!("  Model: {}", model.id);
                }
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Ollama not available - chat requests will return 503");
            tracing::warn!("  Make sure Ollama is running: ollama serve");
        }
    }

    // Support tools over the demo dataset
    let tools = support_desk::demo_registry();
    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    // Session storage
    let store: Arc<dyn SessionStore> = match std::env::var("SESSION_DIR") {
        Ok(dir) => {
            tracing::info!("Sessions persisted under {}", dir);
            Arc::new(FileSessionStore::open(dir).await?)
        }
        Err(_) => {
            tracing::info!("Sessions kept in memory (set SESSION_DIR to persist)");
            Arc::new(MemorySessionStore::new())
        }
    };

    let mut config = AgentConfig::from_env()?;
    config.system_prompt = SUPPORT_AGENT_PROMPT.into();
    tracing::info!(
        model = %config.generation.model,
        max_iterations = config.max_iterations,
        turn_timeout = ?config.turn_timeout,
        "Agent configured"
    );

    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .tools(tools)
        .store(store)
        .config(config)
        .build()?;

    let app = router(AppState {
        agent: Arc::new(agent),
        provider,
    });

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 support agent running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health             - Health check");
    tracing::info!("  GET  /api/models         - List available models");
    tracing::info!("  POST /chat               - Send message");
    tracing::info!("  GET  /api/sessions       - Recent threads");
    tracing::info!("  GET  /api/sessions/{{id}}  - Thread history");

    axum::serve(listener, app).await?;

    Ok(())
}
