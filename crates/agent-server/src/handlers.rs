//! HTTP Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use agent_core::{
    provider::ModelInfo,
    session::SessionSummary,
    AgentError, Message,
};

use crate::state::AppState;

const DEFAULT_THREAD: &str = "default_thread";
const DEFAULT_SESSION_LIMIT: usize = 50;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub ollama_connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_thread")]
    pub thread_id: String,
}

fn default_thread() -> String {
    DEFAULT_THREAD.into()
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub thread_id: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub thread_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Agent failure rendered as `{error, code}` with a matching status
#[derive(Debug)]
pub struct ApiError(pub AgentError);

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AgentError::ReasoningUnavailable(_)
            | AgentError::ProviderUnavailable(_)
            | AgentError::Provider(_) => StatusCode::SERVICE_UNAVAILABLE,
            AgentError::SessionConflict(_) => StatusCode::CONFLICT,
            AgentError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AgentError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AgentError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.0.kind(), "Agent error: {}", self.0);
        } else {
            tracing::warn!(code = self.0.kind(), "Request rejected: {}", self.0);
        }

        let body = ErrorResponse {
            error: self.0.user_message(),
            code: self.0.kind().into(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Liveness banner
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "active",
        message: "AI Agent is online. Use POST /chat to interact.",
    })
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ollama_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        ollama_connected,
    })
}

/// Run one turn on a thread
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let reply = state
        .agent
        .submit_turn(&payload.thread_id, &payload.message)
        .await?;

    Ok(Json(ChatResponse {
        response: reply.response,
        thread_id: reply.session_id.to_string(),
    }))
}

/// Stored history of a thread
pub async fn session_history(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let messages = state.agent.history(&thread_id).await?;
    Ok(Json(HistoryResponse { thread_id, messages }))
}

/// Most recently active threads
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_SESSION_LIMIT);
    Ok(Json(state.agent.store().list(limit).await?))
}

/// Models available from the provider
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Vec<ModelInfo>>, ApiError> {
    Ok(Json(state.provider.list_models().await?))
}
