//! Route table

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    chat_handler, health_check, list_models, list_sessions, root, session_history,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))

        // Agent API
        .route("/chat", post(chat_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/{thread_id}", get(session_history))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
